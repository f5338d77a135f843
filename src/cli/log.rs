//! Transaction log CLI commands

use std::path::PathBuf;

use clap::Subcommand;

use crate::display::transaction::format_transaction_list;
use crate::error::CofferResult;
use crate::models::AccountNumber;
use crate::services::{ArchiveService, BankService};

/// Log subcommands
#[derive(Subcommand)]
pub enum LogCommands {
    /// List log records
    List {
        /// Only records for this account
        #[arg(short, long)]
        account: Option<AccountNumber>,
        /// Show only the most recent N records
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Compress the log into an archive and start a new empty log.
    ///
    /// Archives are Huffman-compressed but NOT encrypted.
    Archive {
        /// Archive path (default: archives/archive_<timestamp>.huff)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the contents of an archive
    View {
        /// Archive path
        path: PathBuf,
    },
    /// List archives in the default archive directory
    Archives,
}

/// Handle a log command
pub fn handle_log_command(
    bank: &BankService<'_>,
    archives: &ArchiveService<'_>,
    cmd: LogCommands,
) -> CofferResult<()> {
    match cmd {
        LogCommands::List { account, limit } => {
            let mut records = match account {
                Some(number) => bank.history(number)?,
                None => bank.transactions()?,
            };
            if let Some(limit) = limit {
                let skip = records.len().saturating_sub(limit);
                records.drain(..skip);
            }
            print!("{}", format_transaction_list(&records));
        }

        LogCommands::Archive { output } => {
            let report = archives.archive_log(output)?;
            println!("Archived {} records to {}", report.records, report.path.display());
            println!(
                "  {} bytes -> {} bytes ({} distinct symbols)",
                report.stats.input_bytes, report.stats.output_bytes, report.stats.distinct_symbols
            );
        }

        LogCommands::View { path } => {
            print!("{}", archives.read_archive(&path)?);
        }

        LogCommands::Archives => {
            let paths = archives.list_archives()?;
            if paths.is_empty() {
                println!("No archives found.");
            }
            for path in paths {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
