//! Encrypted record collections
//!
//! Every collection is one encrypted file. Reading decrypts it into a
//! [`ScratchFile`] and parses the lines; writing renders the lines into a
//! scratch file, encrypts that into a temporary sibling of the target and
//! renames it into place. A crash therefore leaves either the old or the new
//! ciphertext on disk, never a truncated one.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tempfile::Builder;
use tracing::debug;

use super::record::{parse_lines, render_lines, Record};
use super::scratch::ScratchFile;
use crate::crypto::{decrypt_stream, encrypt_stream, SecureBytes, SecureString};
use crate::error::{CofferError, CofferResult};

/// Decrypt `path` into a fresh scratch file
///
/// The scratch file is empty when `path` does not exist yet.
pub fn open_plaintext(
    path: &Path,
    scratch_dir: &Path,
    password: &SecureString,
) -> CofferResult<ScratchFile> {
    let mut scratch = ScratchFile::create_in(scratch_dir)?;
    if !path.exists() {
        return Ok(scratch);
    }

    let input = File::open(path)
        .map_err(|e| CofferError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
    {
        let mut writer = BufWriter::new(scratch.as_file_mut());
        decrypt_stream(BufReader::new(input), &mut writer, password.as_str())?;
        writer.flush()?;
    }
    scratch.rewind()?;
    Ok(scratch)
}

/// Encrypt the scratch contents and atomically replace `path` with the result
pub fn seal_plaintext(
    scratch: &mut ScratchFile,
    path: &Path,
    password: &SecureString,
) -> CofferResult<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| {
        CofferError::Storage(format!(
            "Failed to create directory {}: {}",
            parent.display(),
            e
        ))
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut staged = Builder::new()
        .prefix(&format!(".{}.", file_name))
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| CofferError::Storage(format!("Failed to create temp file: {}", e)))?;

    scratch.rewind()?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        encrypt_stream(BufReader::new(scratch.as_file_mut()), &mut writer, password.as_str())?;
        writer
            .flush()
            .map_err(|e| CofferError::Storage(format!("Failed to flush data: {}", e)))?;
    }

    // Sync to disk before rename
    staged
        .as_file()
        .sync_all()
        .map_err(|e| CofferError::Storage(format!("Failed to sync data: {}", e)))?;

    staged.persist(path).map_err(|e| {
        CofferError::Storage(format!(
            "Failed to replace {}: {}",
            path.display(),
            e.error
        ))
    })?;
    fsync_dir(parent)?;

    Ok(())
}

fn fsync_dir(path: &Path) -> CofferResult<()> {
    #[cfg(unix)]
    {
        let dir = File::open(path)?;
        dir.sync_all()?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

fn decode_utf8(bytes: &SecureBytes) -> CofferResult<&str> {
    std::str::from_utf8(bytes.as_bytes()).map_err(|_| {
        CofferError::WrongPasswordOrCorruptData("decrypted data is not valid text".into())
    })
}

/// Load every record of an encrypted collection
///
/// A missing file is an empty collection.
pub fn read_records<R: Record>(
    path: &Path,
    scratch_dir: &Path,
    password: &SecureString,
) -> CofferResult<Vec<R>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut scratch = open_plaintext(path, scratch_dir, password)?;
    let bytes = scratch.read_all()?;
    let records = parse_lines(decode_utf8(&bytes)?)?;

    debug!(path = %path.display(), kind = R::KIND, count = records.len(), "loaded records");
    Ok(records)
}

/// Replace an encrypted collection with `records`
pub fn write_records<R: Record>(
    path: &Path,
    scratch_dir: &Path,
    password: &SecureString,
    records: &[R],
) -> CofferResult<()> {
    let text = SecureString::new(render_lines(records));
    let mut scratch = ScratchFile::create_in(scratch_dir)?;
    scratch.write_all(text.as_str().as_bytes())?;
    seal_plaintext(&mut scratch, path, password)?;

    debug!(path = %path.display(), kind = R::KIND, count = records.len(), "saved records");
    Ok(())
}

/// Append records to an encrypted collection without loading it into a store
///
/// The existing plaintext must parse before anything is written, so a
/// password that happens to decrypt without a padding error cannot splice
/// valid lines onto garbage.
pub fn append_records<R: Record>(
    path: &Path,
    scratch_dir: &Path,
    password: &SecureString,
    records: &[R],
) -> CofferResult<()> {
    let mut scratch = open_plaintext(path, scratch_dir, password)?;
    let existing = scratch.read_all()?;
    let count = parse_lines::<R>(decode_utf8(&existing)?)?.len();

    let mut text = String::new();
    if existing.as_bytes().last().is_some_and(|&b| b != b'\n') {
        text.push('\n');
    }
    text.push_str(&render_lines(records));
    let text = SecureString::new(text);

    let file = scratch.as_file_mut();
    file.seek(SeekFrom::End(0))?;
    file.write_all(text.as_str().as_bytes())?;
    file.flush()?;

    seal_plaintext(&mut scratch, path, password)?;

    debug!(
        path = %path.display(),
        kind = R::KIND,
        count = count + records.len(),
        "appended records"
    );
    Ok(())
}

/// Append a single record
pub fn append_record<R: Record>(
    path: &Path,
    scratch_dir: &Path,
    password: &SecureString,
    record: &R,
) -> CofferResult<()> {
    append_records(path, scratch_dir, password, std::slice::from_ref(record))
}

/// One encrypted collection held in memory behind its own lock
///
/// The file is read on first use, so a store that was never explicitly
/// loaded still persists on top of what is already on disk.
pub struct EncryptedStore<R> {
    path: PathBuf,
    scratch_dir: PathBuf,
    password: Arc<SecureString>,
    state: Mutex<StoreState<R>>,
}

struct StoreState<R> {
    records: Vec<R>,
    loaded: bool,
}

impl<R: Record + Clone> EncryptedStore<R> {
    pub fn new(path: PathBuf, scratch_dir: PathBuf, password: Arc<SecureString>) -> Self {
        Self {
            path,
            scratch_dir,
            password,
            state: Mutex::new(StoreState {
                records: Vec::new(),
                loaded: false,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> CofferResult<MutexGuard<'_, StoreState<R>>> {
        self.state
            .lock()
            .map_err(|e| CofferError::Storage(format!("Failed to acquire {} lock: {}", R::KIND, e)))
    }

    /// Lock the store, reading the file first if nothing has been loaded yet
    fn lock_loaded(&self) -> CofferResult<MutexGuard<'_, StoreState<R>>> {
        let mut state = self.lock()?;
        if !state.loaded {
            state.records = read_records(&self.path, &self.scratch_dir, &self.password)?;
            state.loaded = true;
        }
        Ok(state)
    }

    /// Replace the in-memory collection with the file's contents
    pub fn load(&self) -> CofferResult<usize> {
        let mut state = self.lock()?;
        state.records = read_records(&self.path, &self.scratch_dir, &self.password)?;
        state.loaded = true;
        Ok(state.records.len())
    }

    /// Write the in-memory collection to disk
    pub fn save(&self) -> CofferResult<()> {
        let state = self.lock_loaded()?;
        write_records(&self.path, &self.scratch_dir, &self.password, &state.records)
    }

    /// Copy of the current records
    pub fn snapshot(&self) -> CofferResult<Vec<R>> {
        Ok(self.lock_loaded()?.records.clone())
    }

    /// Run `f` over the records while holding the lock
    pub fn read<T>(&self, f: impl FnOnce(&[R]) -> T) -> CofferResult<T> {
        let state = self.lock_loaded()?;
        Ok(f(&state.records))
    }

    /// Apply `f` to a working copy, persist it, then make it current
    ///
    /// If `f` or the save fails, memory and disk both keep the previous state.
    /// `f` runs under this store's lock and must not call back into it.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut Vec<R>) -> CofferResult<T>) -> CofferResult<T> {
        let mut state = self.lock_loaded()?;
        let mut working = state.records.clone();
        let out = f(&mut working)?;
        write_records(&self.path, &self.scratch_dir, &self.password, &working)?;
        state.records = working;
        Ok(out)
    }
}
