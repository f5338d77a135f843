//! Bank service
//!
//! Account ledger operations. Each mutating operation is one critical section
//! on the account collection: validate, change a working copy, append the log
//! record(s), then persist the accounts. The log lock is only ever taken
//! while the accounts lock is held, never the other way round.

use tracing::info;

use crate::error::{CofferError, CofferResult};
use crate::models::{AccountNumber, BankAccount, Money, Transaction, TransactionKind};
use crate::storage::accounts::next_account_number;
use crate::storage::Storage;

/// Service for the account ledger
pub struct BankService<'a> {
    storage: &'a Storage,
    first_number: AccountNumber,
}

impl<'a> BankService<'a> {
    /// Create a bank service numbering accounts from 1000
    pub fn new(storage: &'a Storage) -> Self {
        Self::with_first_number(storage, AccountNumber::new(1000))
    }

    pub fn with_first_number(storage: &'a Storage, first_number: AccountNumber) -> Self {
        Self {
            storage,
            first_number,
        }
    }

    /// Open a new account, logging the initial deposit if there is one
    pub fn create_account(&self, holder: &str, initial_deposit: Money) -> CofferResult<BankAccount> {
        let holder = holder.trim();
        if initial_deposit.is_negative() {
            return Err(CofferError::Validation(
                "Initial deposit cannot be negative".into(),
            ));
        }

        let account = self.storage.accounts.mutate(|accounts| {
            let number = next_account_number(accounts, self.first_number).ok_or_else(|| {
                CofferError::Validation("No account numbers left".into())
            })?;

            let account = BankAccount::new(number, holder, initial_deposit);
            account.validate()?;

            if initial_deposit.is_positive() {
                self.storage.transactions.append(&Transaction::new(
                    TransactionKind::Deposit,
                    initial_deposit,
                    Some(number),
                ))?;
            }

            accounts.push(account.clone());
            Ok(account)
        })?;

        info!(account = %account.number, "created account");
        Ok(account)
    }

    pub fn find_account(&self, number: AccountNumber) -> CofferResult<Option<BankAccount>> {
        self.storage.accounts.get(number)
    }

    /// Like [`find_account`](Self::find_account), but a missing account is an error
    pub fn get_account(&self, number: AccountNumber) -> CofferResult<BankAccount> {
        self.find_account(number)?
            .ok_or_else(|| CofferError::account_not_found(number.to_string()))
    }

    pub fn list_accounts(&self) -> CofferResult<Vec<BankAccount>> {
        self.storage.accounts.get_all()
    }

    /// Sum of all balances
    pub fn total_balance(&self) -> CofferResult<Money> {
        Ok(self.list_accounts()?.iter().map(|a| a.balance).sum())
    }

    /// Remove an account; its log records are kept
    pub fn delete_account(&self, number: AccountNumber) -> CofferResult<BankAccount> {
        let removed = self.storage.accounts.mutate(|accounts| {
            let index = position(accounts, number)?;
            Ok(accounts.remove(index))
        })?;

        info!(account = %number, "deleted account");
        Ok(removed)
    }

    pub fn deposit(&self, number: AccountNumber, amount: Money) -> CofferResult<BankAccount> {
        self.storage.accounts.mutate(|accounts| {
            let index = position(accounts, number)?;
            accounts[index].deposit(amount)?;
            self.storage.transactions.append(&Transaction::new(
                TransactionKind::Deposit,
                amount,
                Some(number),
            ))?;
            Ok(accounts[index].clone())
        })
    }

    pub fn withdraw(&self, number: AccountNumber, amount: Money) -> CofferResult<BankAccount> {
        self.storage.accounts.mutate(|accounts| {
            let index = position(accounts, number)?;
            accounts[index].withdraw(amount)?;
            self.storage.transactions.append(&Transaction::new(
                TransactionKind::Withdraw,
                amount,
                Some(number),
            ))?;
            Ok(accounts[index].clone())
        })
    }

    /// Move money between two accounts
    ///
    /// Logs one `Transfer` record per side: negative on the source, positive
    /// on the destination. Returns both accounts after the move.
    pub fn transfer(
        &self,
        from: AccountNumber,
        to: AccountNumber,
        amount: Money,
    ) -> CofferResult<(BankAccount, BankAccount)> {
        if from == to {
            return Err(CofferError::Validation(
                "Cannot transfer to the same account".into(),
            ));
        }

        let result = self.storage.accounts.mutate(|accounts| {
            let source = position(accounts, from)?;
            let destination = position(accounts, to)?;

            accounts[source].withdraw(amount)?;
            accounts[destination].deposit(amount)?;

            let outgoing = Transaction::new(TransactionKind::Transfer, -amount, Some(from));
            let incoming = Transaction::at(
                outgoing.timestamp,
                TransactionKind::Transfer,
                amount,
                Some(to),
            );
            self.storage.transactions.append_all(&[outgoing, incoming])?;

            Ok((accounts[source].clone(), accounts[destination].clone()))
        })?;

        info!(from = %from, to = %to, "transferred funds");
        Ok(result)
    }

    /// Log records for one account, oldest first
    pub fn history(&self, number: AccountNumber) -> CofferResult<Vec<Transaction>> {
        Ok(self
            .transactions()?
            .into_iter()
            .filter(|t| t.involves(number))
            .collect())
    }

    /// Every log record, oldest first
    pub fn transactions(&self) -> CofferResult<Vec<Transaction>> {
        self.storage.transactions.read_all()
    }
}

fn position(accounts: &[BankAccount], number: AccountNumber) -> CofferResult<usize> {
    accounts
        .iter()
        .position(|a| a.number == number)
        .ok_or_else(|| CofferError::account_not_found(number.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::CofferPaths;
    use crate::crypto::SecureString;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = CofferPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths, SecureString::new("test password")).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn dollars(n: i64) -> Money {
        Money::from_cents(n * 100)
    }

    #[test]
    fn test_create_account_numbers_and_logs() {
        let (_temp_dir, storage) = create_test_storage();
        let bank = BankService::new(&storage);

        let first = bank.create_account("Ada", dollars(100)).unwrap();
        let second = bank.create_account("  Grace ", Money::zero()).unwrap();

        assert_eq!(first.number.value(), 1000);
        assert_eq!(second.number.value(), 1001);
        assert_eq!(second.holder, "Grace");

        let log = bank.transactions().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, TransactionKind::Deposit);
        assert_eq!(log[0].related_account, Some(first.number));
    }

    #[test]
    fn test_create_account_validation() {
        let (_temp_dir, storage) = create_test_storage();
        let bank = BankService::new(&storage);

        assert!(bank.create_account("", Money::zero()).unwrap_err().is_validation());
        assert!(bank.create_account("A|B", Money::zero()).unwrap_err().is_validation());
        assert!(bank.create_account("Ada", dollars(-1)).unwrap_err().is_validation());
        assert!(bank.list_accounts().unwrap().is_empty());
        assert!(bank.transactions().unwrap().is_empty());
    }

    #[test]
    fn test_numbering_continues_after_gap() {
        let (_temp_dir, storage) = create_test_storage();
        let bank = BankService::with_first_number(&storage, AccountNumber::new(5000));

        let a = bank.create_account("Ada", Money::zero()).unwrap();
        let b = bank.create_account("Grace", Money::zero()).unwrap();
        bank.delete_account(a.number).unwrap();
        let c = bank.create_account("Linus", Money::zero()).unwrap();

        assert_eq!(b.number.value(), 5001);
        assert_eq!(c.number.value(), 5002);
    }

    #[test]
    fn test_reopened_storage_without_load_keeps_accounts() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CofferPaths::with_base_dir(temp_dir.path().to_path_buf());
        {
            let storage = Storage::open(paths.clone(), SecureString::new("pw")).unwrap();
            let bank = BankService::new(&storage);
            bank.create_account("Ada", Money::zero()).unwrap();
            bank.create_account("Grace", Money::zero()).unwrap();
        }

        let storage = Storage::open(paths, SecureString::new("pw")).unwrap();
        let bank = BankService::new(&storage);
        let linus = bank.create_account("Linus", Money::zero()).unwrap();

        assert_eq!(linus.number.value(), 1002);
        storage.accounts.load().unwrap();
        assert_eq!(storage.accounts.count().unwrap(), 3);
    }

    #[test]
    fn test_deposit_and_withdraw() {
        let (_temp_dir, storage) = create_test_storage();
        let bank = BankService::new(&storage);
        let acct = bank.create_account("Ada", dollars(50)).unwrap();

        let acct = bank.deposit(acct.number, dollars(25)).unwrap();
        assert_eq!(acct.balance, dollars(75));

        let acct = bank.withdraw(acct.number, dollars(70)).unwrap();
        assert_eq!(acct.balance, dollars(5));

        let err = bank.withdraw(acct.number, dollars(6)).unwrap_err();
        assert!(matches!(err, CofferError::InsufficientFunds { .. }));
        assert_eq!(bank.get_account(acct.number).unwrap().balance, dollars(5));

        let kinds: Vec<_> = bank.history(acct.number).unwrap().iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TransactionKind::Deposit,
                TransactionKind::Deposit,
                TransactionKind::Withdraw
            ]
        );
    }

    #[test]
    fn test_unknown_account() {
        let (_temp_dir, storage) = create_test_storage();
        let bank = BankService::new(&storage);
        let missing = AccountNumber::new(4242);

        assert!(bank.find_account(missing).unwrap().is_none());
        assert!(bank.get_account(missing).unwrap_err().is_not_found());
        assert!(bank.deposit(missing, dollars(1)).unwrap_err().is_not_found());
        assert!(bank.delete_account(missing).unwrap_err().is_not_found());
    }

    #[test]
    fn test_transfer() {
        let (_temp_dir, storage) = create_test_storage();
        let bank = BankService::new(&storage);
        let a = bank.create_account("Ada", dollars(100)).unwrap();
        let b = bank.create_account("Grace", Money::zero()).unwrap();

        let (a, b) = bank.transfer(a.number, b.number, dollars(40)).unwrap();
        assert_eq!(a.balance, dollars(60));
        assert_eq!(b.balance, dollars(40));
        assert_eq!(bank.total_balance().unwrap(), dollars(100));

        let out = bank.history(a.number).unwrap();
        assert_eq!(out.last().unwrap().amount, -dollars(40));
        let incoming = bank.history(b.number).unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].kind, TransactionKind::Transfer);
        assert_eq!(incoming[0].amount, dollars(40));
    }

    #[test]
    fn test_failed_transfer_changes_nothing() {
        let (_temp_dir, storage) = create_test_storage();
        let bank = BankService::new(&storage);
        let a = bank.create_account("Ada", dollars(10)).unwrap();
        let b = bank.create_account("Grace", Money::zero()).unwrap();

        assert!(bank.transfer(a.number, b.number, dollars(11)).is_err());
        assert!(bank.transfer(a.number, a.number, dollars(1)).is_err());
        assert!(bank
            .transfer(a.number, AccountNumber::new(9999), dollars(1))
            .unwrap_err()
            .is_not_found());

        assert_eq!(bank.get_account(a.number).unwrap().balance, dollars(10));
        assert_eq!(bank.get_account(b.number).unwrap().balance, Money::zero());
        assert_eq!(bank.transactions().unwrap().len(), 1);
    }

    #[test]
    fn test_state_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CofferPaths::with_base_dir(temp_dir.path().to_path_buf());
        {
            let storage = Storage::open(paths.clone(), SecureString::new("pw")).unwrap();
            let bank = BankService::new(&storage);
            let acct = bank.create_account("Ada", dollars(10)).unwrap();
            bank.deposit(acct.number, dollars(5)).unwrap();
        }

        let storage = Storage::open(paths, SecureString::new("pw")).unwrap();
        storage.load_all().unwrap();
        let bank = BankService::new(&storage);
        let accounts = bank.list_accounts().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, dollars(15));
        assert_eq!(bank.transactions().unwrap().len(), 2);
    }

    #[test]
    fn test_concurrent_deposits_lose_nothing() {
        let (_temp_dir, storage) = create_test_storage();
        let bank = BankService::new(&storage);
        let acct = bank.create_account("Ada", Money::zero()).unwrap();

        const THREADS: usize = 4;
        const DEPOSITS: usize = 3;

        std::thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    let bank = BankService::new(&storage);
                    for _ in 0..DEPOSITS {
                        bank.deposit(acct.number, dollars(1)).unwrap();
                    }
                });
            }
        });

        let expected = dollars((THREADS * DEPOSITS) as i64);
        assert_eq!(bank.get_account(acct.number).unwrap().balance, expected);
        assert_eq!(bank.history(acct.number).unwrap().len(), THREADS * DEPOSITS);

        // Disk agrees with memory
        storage.accounts.load().unwrap();
        assert_eq!(bank.get_account(acct.number).unwrap().balance, expected);
    }
}
