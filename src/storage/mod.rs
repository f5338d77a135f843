//! Storage layer for Coffer
//!
//! Every collection is a password-encrypted file of `|`-delimited lines.
//! Plaintext reaches the disk only as short-lived scratch files, and
//! encrypted files are replaced by atomic rename.
//!
//! Each collection has its own lock. Operations touching both accounts and
//! the transaction log take the accounts lock first.

pub mod accounts;
pub mod encrypted_store;
pub mod record;
pub mod scratch;
pub mod transactions;
pub mod vault;

pub use accounts::AccountRepository;
pub use encrypted_store::{append_record, read_records, write_records, EncryptedStore};
pub use record::Record;
pub use scratch::{sweep_stale, ScratchFile};
pub use transactions::TransactionLog;
pub use vault::VaultRepository;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::paths::CofferPaths;
use crate::crypto::SecureString;
use crate::error::CofferError;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: CofferPaths,
    pub accounts: AccountRepository,
    pub transactions: TransactionLog,
    pub vault: VaultRepository,
}

impl Storage {
    /// Prepare the data directory and build the repositories
    ///
    /// Nothing is decrypted here. Each collection reads its file on first use,
    /// or eagerly through [`load_all`](Self::load_all).
    pub fn open(paths: CofferPaths, password: SecureString) -> Result<Self, CofferError> {
        paths.ensure_directories()?;

        let swept = sweep_stale(&paths.scratch_dir())?;
        if swept > 0 {
            warn!(count = swept, "removed plaintext left by an interrupted operation");
        }

        let password = Arc::new(password);
        let scratch = paths.scratch_dir();

        Ok(Self {
            accounts: AccountRepository::new(
                paths.accounts_file(),
                scratch.clone(),
                password.clone(),
            ),
            transactions: TransactionLog::new(
                paths.transactions_file(),
                scratch.clone(),
                password.clone(),
            ),
            vault: VaultRepository::new(paths.vault_file(), scratch, password),
            paths,
        })
    }

    pub fn paths(&self) -> &CofferPaths {
        &self.paths
    }

    /// Load the in-memory collections from disk
    pub fn load_all(&self) -> Result<(), CofferError> {
        let accounts = self.accounts.load()?;
        let entries = self.vault.load()?;
        debug!(accounts, entries, "loaded storage");
        Ok(())
    }

    /// Save the in-memory collections to disk
    pub fn save_all(&self) -> Result<(), CofferError> {
        self.accounts.save()?;
        self.vault.save()?;
        Ok(())
    }
}
