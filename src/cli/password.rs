//! Password input for CLI commands
//!
//! The master password comes from `COFFER_PASSWORD` when set, otherwise from
//! a hidden terminal prompt.

use crate::crypto::SecureString;
use crate::error::{CofferError, CofferResult};

/// Environment variable holding the master password
pub const PASSWORD_ENV: &str = "COFFER_PASSWORD";

/// Get the master password
///
/// `confirm` asks twice on an interactive prompt, for first use of a data
/// directory.
pub fn master_password(confirm: bool) -> CofferResult<SecureString> {
    if let Some(password) = env_password() {
        return Ok(password);
    }

    if confirm {
        prompt_new_password("New master password: ")
    } else {
        prompt_password("Master password: ")
    }
}

/// Password from the environment, if set and non-empty
pub fn env_password() -> Option<SecureString> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .map(SecureString::new)
}

/// Prompt for a new password with confirmation
pub fn prompt_new_password(prompt: &str) -> CofferResult<SecureString> {
    loop {
        let first = prompt_password(prompt)?;
        if first.is_empty() {
            eprintln!("Password cannot be empty. Please try again.");
            continue;
        }

        let second = prompt_password("Confirm password: ")?;
        if first != second {
            eprintln!("Passwords do not match. Please try again.");
            continue;
        }

        return Ok(first);
    }
}

/// Prompt for a password (hidden input)
pub fn prompt_password(prompt: &str) -> CofferResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::new)
        .map_err(|e| CofferError::Io(format!("Failed to read password: {}", e)))
}
