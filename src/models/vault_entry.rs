//! Password vault entry

use crate::crypto::SecureString;
use crate::error::{CofferError, CofferResult};
use crate::storage::record::{join_fields, split_fields, validate_field, Record};

/// Stored credentials for one service, keyed by service name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEntry {
    pub service: String,
    pub username: String,
    pub password: SecureString,
}

impl VaultEntry {
    pub fn new(
        service: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<SecureString>,
    ) -> Self {
        Self {
            service: service.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check that the entry can be written as a record line
    pub fn validate(&self) -> CofferResult<()> {
        if self.service.trim().is_empty() {
            return Err(CofferError::Validation(
                "Service name cannot be empty".into(),
            ));
        }
        validate_field("Service name", &self.service)?;
        validate_field("Username", &self.username)?;
        validate_field("Password", self.password.as_str())?;
        Ok(())
    }
}

impl Record for VaultEntry {
    const KIND: &'static str = "vault entry";

    fn to_line(&self) -> String {
        join_fields(&[
            self.service.as_str(),
            self.username.as_str(),
            self.password.as_str(),
        ])
    }

    fn from_line(line: &str) -> Result<Self, String> {
        let fields = split_fields(line, 3, 3)?;
        Ok(Self::new(fields[0], fields[1], fields[2]))
    }
}
