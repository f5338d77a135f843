//! Transaction log record
//!
//! One line per ledger event: `timestamp|type|amount|relatedAccount`. The
//! related account is written as `-1` when there is none.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

use super::account::AccountNumber;
use super::money::Money;
use crate::storage::record::{join_fields, split_fields, Record};

/// Timestamp layout in record lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Layout without the zone suffix; read as UTC
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NO_ACCOUNT: &str = "-1";

/// Kind of ledger event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "Deposit",
            Self::Withdraw => "Withdraw",
            Self::Transfer => "Transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Deposit" => Some(Self::Deposit),
            "Withdraw" => Some(Self::Withdraw),
            "Transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ledger event as stored in the transaction log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub timestamp: DateTime<Utc>,
    pub kind: TransactionKind,
    /// Signed amount; the outgoing half of a transfer is negative
    pub amount: Money,
    pub related_account: Option<AccountNumber>,
}

impl Transaction {
    /// Create a transaction stamped with the current time
    pub fn new(kind: TransactionKind, amount: Money, related_account: Option<AccountNumber>) -> Self {
        Self::at(Utc::now(), kind, amount, related_account)
    }

    /// Create a transaction with an explicit timestamp, truncated to seconds
    pub fn at(
        timestamp: DateTime<Utc>,
        kind: TransactionKind,
        amount: Money,
        related_account: Option<AccountNumber>,
    ) -> Self {
        let timestamp = DateTime::from_timestamp(timestamp.timestamp(), 0).unwrap_or(timestamp);
        Self {
            timestamp,
            kind,
            amount,
            related_account,
        }
    }

    /// Check whether this record belongs to an account's history
    pub fn involves(&self, number: AccountNumber) -> bool {
        self.related_account == Some(number)
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, LEGACY_TIMESTAMP_FORMAT))
        .map(|naive| naive.and_utc())
        .map_err(|_| format!("invalid timestamp '{}'", s))
}

impl Record for Transaction {
    const KIND: &'static str = "transaction";

    fn to_line(&self) -> String {
        let related = self
            .related_account
            .map(|n| n.to_string())
            .unwrap_or_else(|| NO_ACCOUNT.to_string());
        join_fields(&[
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.kind.as_str().to_string(),
            self.amount.to_record_string(),
            related,
        ])
    }

    fn from_line(line: &str) -> Result<Self, String> {
        let fields = split_fields(line, 3, 4)?;
        let timestamp = parse_timestamp(fields[0])?;
        let kind = TransactionKind::parse(fields[1])
            .ok_or_else(|| format!("unknown transaction type '{}'", fields[1]))?;
        let amount = Money::parse(fields[2]).map_err(|e| e.to_string())?;
        let related_account = match fields.get(3).map(|s| s.trim()) {
            None | Some(NO_ACCOUNT) => None,
            Some(number) => Some(number.parse()?),
        };

        Ok(Self {
            timestamp,
            kind,
            amount,
            related_account,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 4, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_record_line() {
        let tx = Transaction::at(
            fixed_time(),
            TransactionKind::Deposit,
            Money::from_cents(10_000),
            Some(AccountNumber::new(1000)),
        );
        assert_eq!(tx.to_line(), "2025-01-04T10:30:00Z|Deposit|100.00|1000");
        assert_eq!(Transaction::from_line(&tx.to_line()).unwrap(), tx);
    }

    #[test]
    fn test_no_related_account() {
        let tx = Transaction::at(fixed_time(), TransactionKind::Withdraw, Money::from_cents(5), None);
        assert!(tx.to_line().ends_with("|-1"));
        assert_eq!(Transaction::from_line(&tx.to_line()).unwrap(), tx);
    }

    #[test]
    fn test_missing_fourth_field() {
        let tx = Transaction::from_line("2025-01-04T10:30:00Z|Transfer|-2.50").unwrap();
        assert_eq!(tx.kind, TransactionKind::Transfer);
        assert_eq!(tx.amount.cents(), -250);
        assert_eq!(tx.related_account, None);
    }

    #[test]
    fn test_timestamp_without_zone() {
        let tx = Transaction::from_line("2025-01-04T10:30:00|Deposit|1.00|1001").unwrap();
        assert_eq!(tx.timestamp, fixed_time());
    }

    #[test]
    fn test_bad_lines() {
        assert!(Transaction::from_line("yesterday|Deposit|1.00|1000").is_err());
        assert!(Transaction::from_line("2025-01-04T10:30:00Z|Refund|1.00|1000").is_err());
        assert!(Transaction::from_line("2025-01-04T10:30:00Z|Deposit").is_err());
        assert!(Transaction::from_line("2025-01-04T10:30:00Z|Deposit|1.00|abc").is_err());
    }

    #[test]
    fn test_timestamp_truncated_to_seconds() {
        let tx = Transaction::new(TransactionKind::Deposit, Money::from_cents(1), None);
        assert_eq!(tx.timestamp.timestamp_subsec_nanos(), 0);
    }
}
