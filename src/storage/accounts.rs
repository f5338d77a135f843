//! Account repository
//!
//! Manages the encrypted `accounts.dat` collection.

use std::path::PathBuf;
use std::sync::Arc;

use super::encrypted_store::EncryptedStore;
use crate::crypto::SecureString;
use crate::error::CofferResult;
use crate::models::{AccountNumber, BankAccount};

/// Repository for account persistence
pub struct AccountRepository {
    store: EncryptedStore<BankAccount>,
}

impl AccountRepository {
    pub fn new(path: PathBuf, scratch_dir: PathBuf, password: Arc<SecureString>) -> Self {
        Self {
            store: EncryptedStore::new(path, scratch_dir, password),
        }
    }

    /// Load accounts from disk
    pub fn load(&self) -> CofferResult<usize> {
        self.store.load()
    }

    /// Save accounts to disk
    pub fn save(&self) -> CofferResult<()> {
        self.store.save()
    }

    /// Get an account by number
    pub fn get(&self, number: AccountNumber) -> CofferResult<Option<BankAccount>> {
        self.store
            .read(|accounts| accounts.iter().find(|a| a.number == number).cloned())
    }

    /// All accounts, ordered by number
    pub fn get_all(&self) -> CofferResult<Vec<BankAccount>> {
        let mut accounts = self.store.snapshot()?;
        accounts.sort_by_key(|a| a.number);
        Ok(accounts)
    }

    pub fn count(&self) -> CofferResult<usize> {
        self.store.read(|accounts| accounts.len())
    }

    /// Apply a change to the accounts and persist it; see [`EncryptedStore::mutate`]
    pub fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Vec<BankAccount>) -> CofferResult<T>,
    ) -> CofferResult<T> {
        self.store.mutate(f)
    }
}

/// Number for the next account: one past the highest in use, never below `first`
pub fn next_account_number(
    accounts: &[BankAccount],
    first: AccountNumber,
) -> Option<AccountNumber> {
    match accounts.iter().map(|a| a.number).max() {
        Some(highest) if highest >= first => highest.next(),
        _ => Some(first),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    fn account(number: u32) -> BankAccount {
        BankAccount::new(AccountNumber::new(number), "Ada", Money::zero())
    }

    #[test]
    fn test_next_account_number() {
        let first = AccountNumber::new(1000);
        assert_eq!(next_account_number(&[], first), Some(first));
        assert_eq!(
            next_account_number(&[account(1000), account(1004)], first),
            Some(AccountNumber::new(1005))
        );
        assert_eq!(next_account_number(&[account(5)], first), Some(first));
        assert_eq!(next_account_number(&[account(u32::MAX)], first), None);
    }

    #[test]
    fn test_repository_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let password = Arc::new(SecureString::new("pw"));
        let path = temp_dir.path().join("accounts.dat");
        let scratch = temp_dir.path().join(".scratch");

        let repo = AccountRepository::new(path.clone(), scratch.clone(), password.clone());
        repo.mutate(|accounts| {
            accounts.push(account(1001));
            accounts.push(account(1000));
            Ok(())
        })
        .unwrap();

        let reopened = AccountRepository::new(path, scratch, password);
        assert_eq!(reopened.load().unwrap(), 2);
        let numbers: Vec<u32> = reopened
            .get_all()
            .unwrap()
            .iter()
            .map(|a| a.number.value())
            .collect();
        assert_eq!(numbers, vec![1000, 1001]);
        assert!(reopened.get(AccountNumber::new(1001)).unwrap().is_some());
        assert!(reopened.get(AccountNumber::new(1002)).unwrap().is_none());
    }
}
