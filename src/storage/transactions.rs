//! Transaction log storage
//!
//! The log is append-only and never held in memory: every append decrypts
//! the file into scratch, adds lines and re-encrypts it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use super::encrypted_store::{append_records, open_plaintext, read_records, write_records};
use super::scratch::ScratchFile;
use crate::crypto::SecureString;
use crate::error::{CofferError, CofferResult};
use crate::models::Transaction;

/// The encrypted transaction log
pub struct TransactionLog {
    path: PathBuf,
    scratch_dir: PathBuf,
    password: Arc<SecureString>,
    lock: Mutex<()>,
}

impl TransactionLog {
    pub fn new(path: PathBuf, scratch_dir: PathBuf, password: Arc<SecureString>) -> Self {
        Self {
            path,
            scratch_dir,
            password,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn lock(&self) -> CofferResult<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|e| CofferError::Storage(format!("Failed to acquire log lock: {}", e)))
    }

    /// Append one record
    pub fn append(&self, transaction: &Transaction) -> CofferResult<()> {
        self.append_all(std::slice::from_ref(transaction))
    }

    /// Append several records in one decrypt/encrypt cycle
    pub fn append_all(&self, transactions: &[Transaction]) -> CofferResult<()> {
        if transactions.is_empty() {
            return Ok(());
        }
        let _guard = self.lock()?;
        append_records(&self.path, &self.scratch_dir, &self.password, transactions)
    }

    /// Every record, oldest first
    pub fn read_all(&self) -> CofferResult<Vec<Transaction>> {
        let _guard = self.lock()?;
        read_records(&self.path, &self.scratch_dir, &self.password)
    }

    /// Replace the log with an encrypted empty log
    pub fn clear(&self) -> CofferResult<()> {
        let _guard = self.lock()?;
        write_records::<Transaction>(&self.path, &self.scratch_dir, &self.password, &[])?;
        info!(path = %self.path.display(), "cleared transaction log");
        Ok(())
    }

    /// Run `f` over the decrypted log while holding the lock
    ///
    /// Returns `None` when no log file exists yet.
    pub fn with_plaintext<T>(
        &self,
        f: impl FnOnce(&mut ScratchFile) -> CofferResult<T>,
    ) -> CofferResult<Option<T>> {
        let _guard = self.lock()?;
        self.with_plaintext_locked(f)
    }

    /// Like [`with_plaintext`](Self::with_plaintext), then empty the log if `f` succeeded
    ///
    /// The log is untouched when `f` fails.
    pub fn drain_with<T>(
        &self,
        f: impl FnOnce(&mut ScratchFile) -> CofferResult<T>,
    ) -> CofferResult<Option<T>> {
        let _guard = self.lock()?;
        let Some(out) = self.with_plaintext_locked(f)? else {
            return Ok(None);
        };
        write_records::<Transaction>(&self.path, &self.scratch_dir, &self.password, &[])?;
        info!(path = %self.path.display(), "drained transaction log");
        Ok(Some(out))
    }

    fn with_plaintext_locked<T>(
        &self,
        f: impl FnOnce(&mut ScratchFile) -> CofferResult<T>,
    ) -> CofferResult<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut scratch = open_plaintext(&self.path, &self.scratch_dir, &self.password)?;
        f(&mut scratch).map(Some)
    }
}
