//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod account;
pub mod file;
pub mod log;
pub mod password;
pub mod vault;

pub use account::{handle_account_command, AccountCommands};
pub use file::{handle_file_command, FileCommands};
pub use log::{handle_log_command, LogCommands};
pub use password::master_password;
pub use vault::{handle_vault_command, VaultCommands};
