//! Custom error types for Coffer
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

use crate::models::Money;

/// The main error type for Coffer operations
#[derive(Error, Debug)]
pub enum CofferError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File missing, unreadable or unwritable
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors (settings file)
    #[error("JSON error: {0}")]
    Json(String),

    /// Key derivation or cipher primitive failure
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Decryption produced invalid padding or unreadable plaintext.
    ///
    /// The file format carries no integrity tag, so a wrong password and a
    /// damaged file are the same observable failure.
    #[error("Wrong password or corrupt data: {0}")]
    WrongPasswordOrCorruptData(String),

    /// Huffman tree or bitstream truncated or invalid
    #[error("Malformed archive: {0}")]
    MalformedArchive(String),

    /// Compression requested on a zero-byte source
    #[error("Nothing to compress: input is empty")]
    EmptyInput,

    /// A plaintext record line could not be parsed
    #[error("Corrupt record at line {line}: {reason}")]
    Record { line: usize, reason: String },

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Insufficient funds
    #[error("Insufficient funds in account {account}: need {needed}, have {available}")]
    InsufficientFunds {
        account: String,
        needed: Money,
        available: Money,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CofferError {
    /// Create a "not found" error for accounts
    pub fn account_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Account",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for vault entries
    pub fn entry_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Vault entry",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error means the data could not be decrypted with the
    /// supplied password.
    ///
    /// A record that fails to parse after a structurally successful decrypt
    /// counts too: padding validates by chance for roughly one wrong
    /// password in 256.
    pub fn is_wrong_password(&self) -> bool {
        matches!(
            self,
            Self::WrongPasswordOrCorruptData(_) | Self::Record { .. }
        )
    }
}

impl From<std::io::Error> for CofferError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CofferError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Coffer operations
pub type CofferResult<T> = Result<T, CofferError>;
