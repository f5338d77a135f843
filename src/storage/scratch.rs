//! Transient plaintext files
//!
//! Decrypted record sets touch the disk only as a [`ScratchFile`]: uniquely
//! named, owner-only, inside the scratch directory, and removed when dropped.
//! A hard kill can still leave one behind, which [`sweep_stale`] removes the
//! next time storage opens.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};
use tracing::warn;

use crate::crypto::SecureBytes;
use crate::error::{CofferError, CofferResult};

/// Name prefix of every scratch file
pub const SCRATCH_PREFIX: &str = ".coffer-";

/// A plaintext file that exists for one load/save cycle
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    /// Create a fresh, empty scratch file in `dir`
    pub fn create_in(dir: &Path) -> CofferResult<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            CofferError::Io(format!(
                "Failed to create scratch directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        restrict_dir_permissions(dir);

        let file = Builder::new()
            .prefix(SCRATCH_PREFIX)
            .suffix(".txt")
            .tempfile_in(dir)
            .map_err(|e| CofferError::Io(format!("Failed to create scratch file: {}", e)))?;

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn as_file_mut(&mut self) -> &mut File {
        self.file.as_file_mut()
    }

    /// Replace the contents with `bytes`
    pub fn write_all(&mut self, bytes: &[u8]) -> CofferResult<()> {
        let file = self.file.as_file_mut();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(bytes)?;
        file.flush()?;
        file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// Read the whole file into a zero-on-drop buffer
    pub fn read_all(&mut self) -> CofferResult<SecureBytes> {
        let file = self.file.as_file_mut();
        file.seek(SeekFrom::Start(0))?;
        let mut buf = SecureBytes::default();
        file.read_to_end(buf.as_vec_mut())?;
        file.seek(SeekFrom::Start(0))?;
        Ok(buf)
    }

    /// Rewind to the start, e.g. before handing the file to a reader
    pub fn rewind(&mut self) -> CofferResult<()> {
        self.file.as_file_mut().seek(SeekFrom::Start(0))?;
        Ok(())
    }
}

impl std::fmt::Debug for ScratchFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchFile")
            .field("path", &self.file.path())
            .finish()
    }
}

/// Remove scratch files left over from a previous crash
///
/// Returns the number of files removed. A missing directory is not an error.
pub fn sweep_stale(dir: &Path) -> CofferResult<usize> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(CofferError::Io(format!(
                "Failed to read scratch directory {}: {}",
                dir.display(),
                e
            )))
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(SCRATCH_PREFIX) {
            continue;
        }
        warn!(path = %entry.path().display(), "removing stale plaintext scratch file");
        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %entry.path().display(), error = %e, "failed to remove scratch file"),
        }
    }
    Ok(removed)
}

fn restrict_dir_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o700)) {
            warn!("cannot restrict permissions on {}: {}", path.display(), e);
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn count_entries(dir: &Path) -> usize {
        fs::read_dir(dir).map(|e| e.count()).unwrap_or(0)
    }

    #[test]
    fn test_scratch_removed_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let scratch_dir = temp_dir.path().join(".scratch");

        let path = {
            let mut scratch = ScratchFile::create_in(&scratch_dir).unwrap();
            scratch.write_all(b"1000|Ada|1.00\n").unwrap();
            assert!(scratch.path().exists());
            assert_eq!(scratch.read_all().unwrap().as_bytes(), b"1000|Ada|1.00\n");
            scratch.path().to_path_buf()
        };

        assert!(!path.exists());
        assert_eq!(count_entries(&scratch_dir), 0);
    }

    #[test]
    fn test_scratch_removed_on_panic() {
        let temp_dir = TempDir::new().unwrap();
        let scratch_dir = temp_dir.path().join(".scratch");
        let dir = scratch_dir.clone();

        let result = std::panic::catch_unwind(move || {
            let mut scratch = ScratchFile::create_in(&dir).unwrap();
            scratch.write_all(b"secret").unwrap();
            panic!("boom");
        });

        assert!(result.is_err());
        assert_eq!(count_entries(&scratch_dir), 0);
    }

    #[test]
    fn test_write_all_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let mut scratch = ScratchFile::create_in(temp_dir.path()).unwrap();
        scratch.write_all(b"a much longer first version").unwrap();
        scratch.write_all(b"short").unwrap();
        assert_eq!(scratch.read_all().unwrap().as_bytes(), b"short");
    }

    #[test]
    fn test_unique_names() {
        let temp_dir = TempDir::new().unwrap();
        let a = ScratchFile::create_in(temp_dir.path()).unwrap();
        let b = ScratchFile::create_in(temp_dir.path()).unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(SCRATCH_PREFIX));
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let scratch = ScratchFile::create_in(temp_dir.path()).unwrap();
        let mode = fs::metadata(scratch.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn test_sweep_stale() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join(".coffer-leftover.txt"), b"plaintext").unwrap();
        fs::write(dir.join("unrelated.txt"), b"keep").unwrap();

        assert_eq!(sweep_stale(dir).unwrap(), 1);
        assert!(!dir.join(".coffer-leftover.txt").exists());
        assert!(dir.join("unrelated.txt").exists());
    }

    #[test]
    fn test_sweep_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(sweep_stale(&temp_dir.path().join("nope")).unwrap(), 0);
    }
}
