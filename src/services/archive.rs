//! Transaction log archival
//!
//! Archiving compresses the decrypted log into a Huffman archive and then
//! replaces the log with an empty encrypted one. Archives are compressed but
//! not encrypted.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tempfile::Builder;
use tracing::info;

use crate::compression::{compress, decompress_bytes, CompressionStats};
use crate::error::{CofferError, CofferResult};
use crate::models::Transaction;
use crate::storage::record::parse_lines;
use crate::storage::Storage;

/// File extension of log archives
pub const ARCHIVE_EXTENSION: &str = "huff";

/// Outcome of archiving the log
#[derive(Debug, Clone)]
pub struct ArchiveReport {
    pub path: PathBuf,
    pub records: usize,
    pub stats: CompressionStats,
}

/// Service for archiving and reading transaction logs
pub struct ArchiveService<'a> {
    storage: &'a Storage,
}

impl<'a> ArchiveService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Default archive path for the current time
    pub fn default_archive_path(&self) -> PathBuf {
        let name = format!(
            "archive_{}.{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            ARCHIVE_EXTENSION
        );
        self.storage.paths().archive_dir().join(name)
    }

    /// Compress the log into an archive and empty the log
    ///
    /// An existing file at the destination is never overwritten. If anything
    /// fails before the archive is in place, the log is left untouched.
    pub fn archive_log(&self, output: Option<PathBuf>) -> CofferResult<ArchiveReport> {
        let log = &self.storage.transactions;
        let path = output.unwrap_or_else(|| self.default_archive_path());

        let report = log.drain_with(|scratch| {
            let plaintext = scratch.read_all()?;
            if plaintext.as_bytes().is_empty() {
                return Err(CofferError::EmptyInput);
            }
            // Refuse to archive (and then erase) something that is not a log
            let text = std::str::from_utf8(plaintext.as_bytes()).map_err(|_| {
                CofferError::WrongPasswordOrCorruptData("decrypted log is not valid text".into())
            })?;
            let records = parse_lines::<Transaction>(text)?.len();
            if records == 0 {
                return Err(CofferError::EmptyInput);
            }

            scratch.rewind()?;
            let stats = write_archive(scratch.as_file_mut(), &path)?;
            Ok(ArchiveReport {
                path: path.clone(),
                records,
                stats,
            })
        })?;

        let report = report.ok_or_else(|| CofferError::NotFound {
            entity_type: "Transaction log",
            identifier: log.path().display().to_string(),
        })?;

        info!(
            path = %report.path.display(),
            records = report.records,
            output_bytes = report.stats.output_bytes,
            "archived transaction log"
        );
        Ok(report)
    }

    /// Decompress an archive and return its text
    pub fn read_archive(&self, path: &Path) -> CofferResult<String> {
        read_archive(path)
    }

    /// Archives in the default archive directory, oldest name first
    pub fn list_archives(&self) -> CofferResult<Vec<PathBuf>> {
        let dir = self.storage.paths().archive_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut archives: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == ARCHIVE_EXTENSION))
            .collect();
        archives.sort();
        Ok(archives)
    }
}

/// Decompress an archive file in memory and return its text
pub fn read_archive(path: &Path) -> CofferResult<String> {
    let bytes = fs::read(path)
        .map_err(|e| CofferError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    let plain = decompress_bytes(&bytes)?;
    String::from_utf8(plain)
        .map_err(|_| CofferError::MalformedArchive("archive does not contain text".into()))
}

/// Compress `input` to a temporary sibling of `path`, then move it into place
fn write_archive(input: &mut fs::File, path: &Path) -> CofferResult<CompressionStats> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut staged = Builder::new()
        .prefix(".archive-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| CofferError::Io(format!("Failed to create temp file: {}", e)))?;

    let stats = {
        let mut writer = BufWriter::new(staged.as_file_mut());
        let stats = compress(input, &mut writer)?;
        writer.flush()?;
        stats
    };
    staged.as_file().sync_all()?;

    staged.persist_noclobber(path).map_err(|e| {
        CofferError::Io(format!("Failed to write {}: {}", path.display(), e.error))
    })?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::CofferPaths;
    use crate::crypto::SecureString;
    use crate::models::Money;
    use crate::services::BankService;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = CofferPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths, SecureString::new("pw")).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_archive_round_trip() {
        let (temp_dir, storage) = create_test_storage();
        let bank = BankService::new(&storage);
        let acct = bank.create_account("Ada", Money::from_cents(10_000)).unwrap();
        bank.withdraw(acct.number, Money::from_cents(2_500)).unwrap();

        let expected: String = bank
            .transactions()
            .unwrap()
            .iter()
            .map(|t| format!("{}\n", crate::storage::Record::to_line(t)))
            .collect();

        let archives = ArchiveService::new(&storage);
        let target = temp_dir.path().join("log.huff");
        let report = archives.archive_log(Some(target.clone())).unwrap();

        assert_eq!(report.path, target);
        assert_eq!(report.records, 2);
        assert_eq!(report.stats.input_bytes, expected.len() as u64);
        assert_eq!(archives.read_archive(&target).unwrap(), expected);

        // Log is now an encrypted empty log; balances are unchanged
        assert!(storage.transactions.exists());
        assert!(bank.transactions().unwrap().is_empty());
        assert_eq!(bank.get_account(acct.number).unwrap().balance.cents(), 7_500);
    }

    #[test]
    fn test_default_archive_location() {
        let (_temp_dir, storage) = create_test_storage();
        let bank = BankService::new(&storage);
        bank.create_account("Ada", Money::from_cents(100)).unwrap();

        let archives = ArchiveService::new(&storage);
        let report = archives.archive_log(None).unwrap();
        let name = report.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("archive_"));
        assert!(name.ends_with(".huff"));
        assert_eq!(archives.list_archives().unwrap(), vec![report.path]);
    }

    #[test]
    fn test_missing_log_is_not_found() {
        let (_temp_dir, storage) = create_test_storage();
        let err = ArchiveService::new(&storage).archive_log(None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_empty_log_is_empty_input() {
        let (_temp_dir, storage) = create_test_storage();
        storage.transactions.clear().unwrap();
        let err = ArchiveService::new(&storage).archive_log(None).unwrap_err();
        assert!(matches!(err, CofferError::EmptyInput));
    }

    #[test]
    fn test_existing_archive_not_overwritten() {
        let (temp_dir, storage) = create_test_storage();
        let bank = BankService::new(&storage);
        bank.create_account("Ada", Money::from_cents(100)).unwrap();

        let target = temp_dir.path().join("taken.huff");
        fs::write(&target, b"keep me").unwrap();

        assert!(ArchiveService::new(&storage)
            .archive_log(Some(target.clone()))
            .is_err());
        assert_eq!(fs::read(&target).unwrap(), b"keep me");
        assert_eq!(bank.transactions().unwrap().len(), 1);
    }

    #[test]
    fn test_read_malformed_archive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.huff");
        fs::write(&path, [0x00, 0x01]).unwrap();
        assert!(matches!(
            read_archive(&path),
            Err(CofferError::MalformedArchive(_))
        ));
    }
}
