//! Password vault service
//!
//! Entries are keyed by service name. Every change is persisted before it
//! becomes visible.

use tracing::info;

use crate::crypto::SecureString;
use crate::error::{CofferError, CofferResult};
use crate::models::VaultEntry;
use crate::storage::Storage;

/// Service for the password vault
pub struct PasswordService<'a> {
    storage: &'a Storage,
}

impl<'a> PasswordService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn list_entries(&self) -> CofferResult<Vec<VaultEntry>> {
        self.storage.vault.get_all()
    }

    pub fn find_entry(&self, service: &str) -> CofferResult<Option<VaultEntry>> {
        self.storage.vault.get(service.trim())
    }

    /// Add credentials for a service not yet in the vault
    pub fn add_entry(
        &self,
        service: &str,
        username: &str,
        password: SecureString,
    ) -> CofferResult<VaultEntry> {
        let entry = VaultEntry::new(service.trim(), username.trim(), password);
        entry.validate()?;

        self.storage.vault.mutate(|entries| {
            if entries.iter().any(|e| e.service == entry.service) {
                return Err(CofferError::Duplicate {
                    entity_type: "Vault entry",
                    identifier: entry.service.clone(),
                });
            }
            entries.push(entry.clone());
            Ok(())
        })?;

        info!(service = %entry.service, "added vault entry");
        Ok(entry)
    }

    pub fn delete_entry(&self, service: &str) -> CofferResult<VaultEntry> {
        let service = service.trim();
        let removed = self.storage.vault.mutate(|entries| {
            let index = entries
                .iter()
                .position(|e| e.service == service)
                .ok_or_else(|| CofferError::entry_not_found(service))?;
            Ok(entries.remove(index))
        })?;

        info!(service = %service, "deleted vault entry");
        Ok(removed)
    }
}
