//! Account CLI commands
//!
//! Implements CLI commands for the account ledger.

use clap::Subcommand;

use crate::display::account::{format_account_details, format_account_list};
use crate::error::{CofferError, CofferResult};
use crate::models::{AccountNumber, Money};
use crate::services::BankService;

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    Create {
        /// Account holder name
        holder: String,
        /// Initial deposit (e.g., "100.00" or "100")
        #[arg(short, long, default_value = "0")]
        deposit: String,
    },
    /// List all accounts
    List,
    /// Show an account and its history
    Show {
        /// Account number
        number: AccountNumber,
    },
    /// Close an account (its log records are kept)
    Delete {
        /// Account number
        number: AccountNumber,
    },
    /// Deposit money into an account
    Deposit {
        /// Account number
        number: AccountNumber,
        /// Amount (e.g., "25.50")
        amount: String,
    },
    /// Withdraw money from an account
    Withdraw {
        /// Account number
        number: AccountNumber,
        /// Amount (e.g., "25.50")
        amount: String,
    },
    /// Move money between accounts
    Transfer {
        /// Source account number
        from: AccountNumber,
        /// Destination account number
        to: AccountNumber,
        /// Amount (e.g., "25.50")
        amount: String,
    },
}

/// Parse a user-entered amount
pub(crate) fn parse_amount(input: &str) -> CofferResult<Money> {
    Money::parse(input).map_err(|e| {
        CofferError::Validation(format!(
            "Invalid amount: '{}'. Use a format like '100.00' or '100'. Error: {}",
            input, e
        ))
    })
}

/// Handle an account command
pub fn handle_account_command(bank: &BankService<'_>, cmd: AccountCommands) -> CofferResult<()> {
    match cmd {
        AccountCommands::Create { holder, deposit } => {
            let initial = parse_amount(&deposit)?;
            let account = bank.create_account(&holder, initial)?;

            println!("Created account: {}", account.number);
            println!("  Holder:  {}", account.holder);
            println!("  Balance: {}", account.balance);
        }

        AccountCommands::List => {
            let accounts = bank.list_accounts()?;
            print!("{}", format_account_list(&accounts));
        }

        AccountCommands::Show { number } => {
            let account = bank.get_account(number)?;
            let history = bank.history(number)?;
            print!("{}", format_account_details(&account, &history));
        }

        AccountCommands::Delete { number } => {
            let removed = bank.delete_account(number)?;
            println!(
                "Deleted account: {} ({}, final balance {})",
                removed.number, removed.holder, removed.balance
            );
        }

        AccountCommands::Deposit { number, amount } => {
            let account = bank.deposit(number, parse_amount(&amount)?)?;
            println!("Deposited into {}. New balance: {}", account.number, account.balance);
        }

        AccountCommands::Withdraw { number, amount } => {
            let account = bank.withdraw(number, parse_amount(&amount)?)?;
            println!("Withdrew from {}. New balance: {}", account.number, account.balance);
        }

        AccountCommands::Transfer { from, to, amount } => {
            let amount = parse_amount(&amount)?;
            let (source, destination) = bank.transfer(from, to, amount)?;
            println!("Transferred {} from {} to {}", amount, source.number, destination.number);
            println!("  {} balance: {}", source.number, source.balance);
            println!("  {} balance: {}", destination.number, destination.balance);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.5").unwrap().cents(), 1250);
        assert!(parse_amount("twelve").unwrap_err().is_validation());
    }
}
