//! Vault repository for the encrypted `vault.dat` collection

use std::path::PathBuf;
use std::sync::Arc;

use super::encrypted_store::EncryptedStore;
use crate::crypto::SecureString;
use crate::error::CofferResult;
use crate::models::VaultEntry;

pub struct VaultRepository {
    store: EncryptedStore<VaultEntry>,
}

impl VaultRepository {
    pub fn new(path: PathBuf, scratch_dir: PathBuf, password: Arc<SecureString>) -> Self {
        Self {
            store: EncryptedStore::new(path, scratch_dir, password),
        }
    }

    pub fn load(&self) -> CofferResult<usize> {
        self.store.load()
    }

    pub fn save(&self) -> CofferResult<()> {
        self.store.save()
    }

    /// Entries in insertion order
    pub fn get_all(&self) -> CofferResult<Vec<VaultEntry>> {
        self.store.snapshot()
    }

    pub fn get(&self, service: &str) -> CofferResult<Option<VaultEntry>> {
        self.store
            .read(|entries| entries.iter().find(|e| e.service == service).cloned())
    }

    pub fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Vec<VaultEntry>) -> CofferResult<T>,
    ) -> CofferResult<T> {
        self.store.mutate(f)
    }
}
