//! Coffer - password-protected personal ledger and password vault
//!
//! Every file Coffer keeps is encrypted with a master password (AES-256-CBC,
//! PBKDF2-HMAC-SHA256 key derivation). Transaction logs can be archived with
//! a Huffman codec.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `crypto`: Key derivation and the streaming file cipher
//! - `compression`: Huffman archive codec
//! - `models`: Accounts, transactions and vault entries
//! - `storage`: Encrypted record collections
//! - `services`: Business logic layer
//! - `cli`, `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,no_run
//! use coffer::config::CofferPaths;
//! use coffer::crypto::SecureString;
//! use coffer::models::Money;
//! use coffer::services::BankService;
//! use coffer::storage::Storage;
//!
//! # fn main() -> Result<(), coffer::CofferError> {
//! let storage = Storage::open(CofferPaths::new()?, SecureString::new("master"))?;
//! storage.load_all()?;
//! let bank = BankService::new(&storage);
//! let account = bank.create_account("Ada", Money::from_cents(10_000))?;
//! bank.deposit(account.number, Money::from_cents(2_500))?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod compression;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{CofferError, CofferResult};
