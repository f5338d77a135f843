//! Business logic layer for Coffer
//!
//! Services borrow a [`Storage`](crate::storage::Storage) and implement the
//! ledger, vault and archival operations on top of it.

pub mod archive;
pub mod bank;
pub mod password;

pub use archive::{ArchiveReport, ArchiveService};
pub use bank::BankService;
pub use password::PasswordService;
