//! Core data models for Coffer
//!
//! Each model that is persisted implements
//! [`Record`](crate::storage::record::Record) and defines its own line format.

pub mod account;
pub mod money;
pub mod transaction;
pub mod vault_entry;

pub use account::{AccountNumber, BankAccount};
pub use money::{Money, MoneyParseError};
pub use transaction::{Transaction, TransactionKind};
pub use vault_entry::VaultEntry;
