//! Password vault CLI commands

use clap::Subcommand;

use super::password::prompt_password;
use crate::crypto::SecureString;
use crate::display::vault::format_vault_list;
use crate::error::CofferResult;
use crate::services::PasswordService;

/// Vault subcommands
#[derive(Subcommand)]
pub enum VaultCommands {
    /// List stored credentials
    List {
        /// Show passwords in clear text
        #[arg(long)]
        reveal: bool,
    },
    /// Store credentials for a service
    Add {
        /// Service name (unique)
        service: String,
        /// Username for the service
        username: String,
        /// Password to store (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Remove the credentials for a service
    Delete {
        /// Service name
        service: String,
    },
}

/// Handle a vault command
pub fn handle_vault_command(vault: &PasswordService<'_>, cmd: VaultCommands) -> CofferResult<()> {
    match cmd {
        VaultCommands::List { reveal } => {
            let entries = vault.list_entries()?;
            print!("{}", format_vault_list(&entries, reveal));
        }

        VaultCommands::Add {
            service,
            username,
            password,
        } => {
            let password = match password {
                Some(p) => SecureString::new(p),
                None => prompt_password(&format!("Password for {}: ", service))?,
            };
            let entry = vault.add_entry(&service, &username, password)?;
            println!("Added vault entry: {}", entry.service);
        }

        VaultCommands::Delete { service } => {
            let removed = vault.delete_entry(&service)?;
            println!("Deleted vault entry: {}", removed.service);
        }
    }

    Ok(())
}
