use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use coffer::cli::{
    handle_account_command, handle_file_command, handle_log_command, handle_vault_command,
    master_password,
};
use coffer::config::{paths::CofferPaths, settings::Settings};
use coffer::services::{ArchiveService, BankService, PasswordService};
use coffer::storage::Storage;

#[derive(Parser)]
#[command(
    name = "coffer",
    version,
    about = "Password-protected personal ledger and password vault",
    long_about = "Coffer keeps bank accounts, a transaction log and a password vault \
                  in files encrypted with a master password. Set COFFER_PASSWORD to \
                  skip the interactive prompt."
)]
struct Cli {
    /// Base directory for data and settings
    #[arg(long, global = true, env = "COFFER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Account ledger commands
    #[command(subcommand, alias = "acct")]
    Account(coffer::cli::AccountCommands),

    /// Transaction log commands
    #[command(subcommand)]
    Log(coffer::cli::LogCommands),

    /// Password vault commands
    #[command(subcommand)]
    Vault(coffer::cli::VaultCommands),

    /// Encrypt, decrypt, compress or decompress standalone files
    #[command(subcommand)]
    File(coffer::cli::FileCommands),

    /// Show current configuration and paths
    Config,
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("coffer=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_storage(paths: &CofferPaths) -> Result<Storage> {
    let password = master_password(!paths.has_data())?;
    let storage = Storage::open(paths.clone(), password)?;

    if let Err(e) = storage.load_all() {
        if e.is_wrong_password() {
            anyhow::bail!("Could not unlock data: wrong password or corrupt data ({})", e);
        }
        return Err(e.into());
    }
    Ok(storage)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = match cli.data_dir {
        Some(dir) => CofferPaths::with_base_dir(dir),
        None => CofferPaths::new()?,
    };
    let settings = Settings::load_or_create(&paths)?;
    init_tracing(&settings);

    match cli.command {
        Some(Commands::Account(cmd)) => {
            let storage = open_storage(&paths)?;
            let bank = BankService::with_first_number(&storage, settings.first_account_number());
            handle_account_command(&bank, cmd)?;
        }
        Some(Commands::Log(cmd)) => {
            let storage = open_storage(&paths)?;
            let bank = BankService::with_first_number(&storage, settings.first_account_number());
            handle_log_command(&bank, &ArchiveService::new(&storage), cmd)?;
        }
        Some(Commands::Vault(cmd)) => {
            let storage = open_storage(&paths)?;
            handle_vault_command(&PasswordService::new(&storage), cmd)?;
        }
        Some(Commands::File(cmd)) => {
            handle_file_command(cmd)?;
        }
        Some(Commands::Config) => {
            println!("Coffer Configuration");
            println!("====================");
            println!("Base directory:    {}", paths.base_dir().display());
            println!("Data directory:    {}", paths.data_dir().display());
            println!("Archive directory: {}", paths.archive_dir().display());
            println!("Settings file:     {}", paths.settings_file().display());
            println!();
            println!("Settings:");
            println!("  First account number: {}", settings.first_account_number);
            println!("  Log filter:           {}", settings.log_filter);
        }
        None => {
            println!("Coffer - encrypted ledger and password vault");
            println!();
            println!("Run 'coffer --help' for usage information.");
        }
    }

    Ok(())
}
