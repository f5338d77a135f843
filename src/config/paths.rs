//! Path management for Coffer
//!
//! ## Path Resolution Order
//!
//! 1. `COFFER_DATA_DIR` environment variable or `--data-dir` (if set)
//! 2. The platform configuration directory for `coffer`
//!    (`~/.config/coffer` on Linux, `%APPDATA%\coffer\config` on Windows)

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::CofferError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "COFFER_DATA_DIR";

/// Manages all paths used by Coffer
#[derive(Debug, Clone)]
pub struct CofferPaths {
    base_dir: PathBuf,
}

impl CofferPaths {
    /// Resolve the base directory from the environment or the platform default
    pub fn new() -> Result<Self, CofferError> {
        let base_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create CofferPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Encrypted collections live here
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Transient plaintext during load/save cycles
    pub fn scratch_dir(&self) -> PathBuf {
        self.data_dir().join(".scratch")
    }

    /// Default destination of compressed log archives
    pub fn archive_dir(&self) -> PathBuf {
        self.base_dir.join("archives")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn accounts_file(&self) -> PathBuf {
        self.data_dir().join("accounts.dat")
    }

    pub fn transactions_file(&self) -> PathBuf {
        self.data_dir().join("transactions.dat")
    }

    pub fn vault_file(&self) -> PathBuf {
        self.data_dir().join("vault.dat")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), CofferError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| CofferError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| CofferError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.scratch_dir())
            .map_err(|e| CofferError::Io(format!("Failed to create scratch directory: {}", e)))?;

        std::fs::create_dir_all(self.archive_dir())
            .map_err(|e| CofferError::Io(format!("Failed to create archive directory: {}", e)))?;

        Ok(())
    }

    /// True once any encrypted collection has been written
    pub fn has_data(&self) -> bool {
        self.accounts_file().exists()
            || self.transactions_file().exists()
            || self.vault_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, CofferError> {
    ProjectDirs::from("", "", "coffer")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| CofferError::Config("Could not determine the home directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CofferPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
        assert_eq!(
            paths.scratch_dir(),
            temp_dir.path().join("data").join(".scratch")
        );
        assert_eq!(paths.archive_dir(), temp_dir.path().join("archives"));
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CofferPaths::with_base_dir(temp_dir.path().join("nested"));

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
        assert!(paths.scratch_dir().exists());
        assert!(paths.archive_dir().exists());
        assert!(!paths.has_data());
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = CofferPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert_eq!(
            paths.accounts_file(),
            temp_dir.path().join("data").join("accounts.dat")
        );
        assert_eq!(
            paths.transactions_file(),
            temp_dir.path().join("data").join("transactions.dat")
        );
        assert_eq!(
            paths.vault_file(),
            temp_dir.path().join("data").join("vault.dat")
        );
    }
}
