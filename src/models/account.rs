//! Bank account model

use std::fmt;
use std::str::FromStr;

use super::money::Money;
use crate::error::{CofferError, CofferResult};
use crate::storage::record::{join_fields, split_fields, validate_field, Record};

/// Account number, unique within one data directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountNumber(u32);

impl AccountNumber {
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }

    /// The number after this one, `None` on overflow
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| format!("invalid account number '{}'", s))
    }
}

/// A bank account and its current balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankAccount {
    pub number: AccountNumber,
    pub holder: String,
    pub balance: Money,
}

impl BankAccount {
    pub fn new(number: AccountNumber, holder: impl Into<String>, balance: Money) -> Self {
        Self {
            number,
            holder: holder.into(),
            balance,
        }
    }

    /// Check that the account can be written as a record line
    pub fn validate(&self) -> CofferResult<()> {
        let holder = self.holder.trim();
        if holder.is_empty() {
            return Err(CofferError::Validation(
                "Account holder name cannot be empty".into(),
            ));
        }
        validate_field("Account holder name", holder)?;
        if self.balance.is_negative() {
            return Err(CofferError::Validation(format!(
                "Balance of account {} cannot be negative",
                self.number
            )));
        }
        Ok(())
    }

    /// Add a positive amount to the balance
    pub fn deposit(&mut self, amount: Money) -> CofferResult<()> {
        if !amount.is_positive() {
            return Err(CofferError::Validation(
                "Deposit amount must be positive".into(),
            ));
        }
        self.balance = self.balance.checked_add(amount).ok_or_else(|| {
            CofferError::Validation(format!("Balance of account {} would overflow", self.number))
        })?;
        Ok(())
    }

    /// Remove a positive amount, never below zero
    pub fn withdraw(&mut self, amount: Money) -> CofferResult<()> {
        if !amount.is_positive() {
            return Err(CofferError::Validation(
                "Withdrawal amount must be positive".into(),
            ));
        }
        if amount > self.balance {
            return Err(CofferError::InsufficientFunds {
                account: self.number.to_string(),
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }
}

impl Record for BankAccount {
    const KIND: &'static str = "account";

    fn to_line(&self) -> String {
        join_fields(&[
            self.number.to_string(),
            self.holder.clone(),
            self.balance.to_record_string(),
        ])
    }

    fn from_line(line: &str) -> Result<Self, String> {
        let fields = split_fields(line, 3, 3)?;
        let number = fields[0].parse()?;
        let balance = Money::parse(fields[2]).map_err(|e| e.to_string())?;
        Ok(Self::new(number, fields[1], balance))
    }
}

impl fmt::Display for BankAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number, self.holder)
    }
}
