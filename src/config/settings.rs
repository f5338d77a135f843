//! User settings for Coffer
//!
//! Stored as `config.json` in the base directory. Cryptographic parameters are
//! fixed by the file format and are not settings.

use serde::{Deserialize, Serialize};

use super::paths::CofferPaths;
use crate::error::CofferError;
use crate::models::AccountNumber;

/// User settings for Coffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Number given to the first account created
    #[serde(default = "default_first_account_number")]
    pub first_account_number: u32,

    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_first_account_number() -> u32 {
    1000
}

fn default_log_filter() -> String {
    "coffer=warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            first_account_number: default_first_account_number(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    pub fn first_account_number(&self) -> AccountNumber {
        AccountNumber::new(self.first_account_number)
    }

    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &CofferPaths) -> Result<Self, CofferError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Don't save yet - let caller decide when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| CofferError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| CofferError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &CofferPaths) -> Result<(), CofferError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| CofferError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| CofferError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
