//! Streaming AES-256-CBC file encryption
//!
//! Encrypted files are self-contained:
//!
//! ```text
//! [0..16)   salt (PBKDF2 input)
//! [16..32)  IV
//! [32..)    AES-256-CBC ciphertext, PKCS#7 padded
//! ```
//!
//! There is no magic number, version byte or integrity tag. Decrypting with
//! the wrong password usually fails on padding, but roughly one time in 256
//! the padding validates and garbage plaintext is returned without error.
//! Callers that parse the plaintext must treat a parse failure the same way
//! as `WrongPasswordOrCorruptData`.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;
use zeroize::Zeroize;

use crate::error::{CofferError, CofferResult};

use super::key_derivation::{derive_key, generate_salt, SALT_SIZE};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Size of the CBC initialization vector in bytes
pub const IV_SIZE: usize = 16;

/// Size of the `salt || iv` header in bytes
pub const HEADER_SIZE: usize = SALT_SIZE + IV_SIZE;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Plaintext is read and encrypted in chunks of this size
pub const CHUNK_SIZE: usize = 4096;

/// Encrypt a file with a password
///
/// Creates or overwrites `ciphertext_path`. On error the destination content
/// is undefined and must be discarded.
pub fn encrypt_file(
    plaintext_path: impl AsRef<Path>,
    ciphertext_path: impl AsRef<Path>,
    password: &str,
) -> CofferResult<()> {
    let plaintext_path = plaintext_path.as_ref();
    let ciphertext_path = ciphertext_path.as_ref();

    let input = File::open(plaintext_path).map_err(|e| {
        CofferError::Io(format!("Failed to open {}: {}", plaintext_path.display(), e))
    })?;
    let output = File::create(ciphertext_path).map_err(|e| {
        CofferError::Io(format!("Failed to create {}: {}", ciphertext_path.display(), e))
    })?;

    let mut writer = BufWriter::new(output);
    let bytes = encrypt_stream(BufReader::new(input), &mut writer, password)?;
    writer.flush()?;

    debug!(
        path = %ciphertext_path.display(),
        plaintext_bytes = bytes,
        "encrypted file"
    );
    Ok(())
}

/// Decrypt a file produced by [`encrypt_file`]
///
/// Creates or overwrites `plaintext_path`. On error the destination content
/// is undefined and must be discarded.
pub fn decrypt_file(
    ciphertext_path: impl AsRef<Path>,
    plaintext_path: impl AsRef<Path>,
    password: &str,
) -> CofferResult<()> {
    let ciphertext_path = ciphertext_path.as_ref();
    let plaintext_path = plaintext_path.as_ref();

    let input = File::open(ciphertext_path).map_err(|e| {
        CofferError::Io(format!("Failed to open {}: {}", ciphertext_path.display(), e))
    })?;
    let output = File::create(plaintext_path).map_err(|e| {
        CofferError::Io(format!("Failed to create {}: {}", plaintext_path.display(), e))
    })?;

    let mut writer = BufWriter::new(output);
    let bytes = decrypt_stream(BufReader::new(input), &mut writer, password)?;
    writer.flush()?;

    debug!(
        path = %ciphertext_path.display(),
        plaintext_bytes = bytes,
        "decrypted file"
    );
    Ok(())
}

/// Encrypt everything from `reader` into `writer`
///
/// Returns the number of plaintext bytes consumed.
pub fn encrypt_stream<R: Read, W: Write>(reader: R, writer: W, password: &str) -> CofferResult<u64> {
    let salt = generate_salt();
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    encrypt_with_header(reader, writer, password, &salt, &iv)
}

/// Encrypt with an explicit salt and IV
pub(crate) fn encrypt_with_header<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    password: &str,
    salt: &[u8; SALT_SIZE],
    iv: &[u8; IV_SIZE],
) -> CofferResult<u64> {
    let key = derive_key(password, salt)?;
    let mut cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| CofferError::Crypto(format!("Failed to create cipher: {}", e)))?;

    writer.write_all(salt)?;
    writer.write_all(iv)?;

    // One spare block so the final padded block always fits
    let mut buf = vec![0u8; CHUNK_SIZE + BLOCK_SIZE];
    let mut filled = 0;
    let mut total: u64 = 0;

    loop {
        let n = read_some(&mut reader, &mut buf[filled..CHUNK_SIZE])?;
        if n == 0 {
            break;
        }
        filled += n;
        total += n as u64;

        // PKCS#7 always appends a block of its own, so every complete
        // block can be encrypted as soon as it is available.
        let complete = filled - filled % BLOCK_SIZE;
        for block in buf[..complete].chunks_exact_mut(BLOCK_SIZE) {
            cipher.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        writer.write_all(&buf[..complete])?;

        buf.copy_within(complete..filled, 0);
        filled -= complete;
    }

    let tail = cipher
        .encrypt_padded_mut::<Pkcs7>(&mut buf, filled)
        .map_err(|_| CofferError::Crypto("Failed to pad final block".into()))?;
    writer.write_all(tail)?;

    buf.zeroize();
    Ok(total)
}

/// Decrypt everything from `reader` into `writer`
///
/// Returns the number of plaintext bytes produced.
pub fn decrypt_stream<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    password: &str,
) -> CofferResult<u64> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CofferError::WrongPasswordOrCorruptData(format!(
                "file is shorter than the {}-byte header",
                HEADER_SIZE
            ))
        } else {
            CofferError::from(e)
        }
    })?;

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&header[..SALT_SIZE]);
    let iv = &header[SALT_SIZE..];

    let key = derive_key(password, &salt)?;
    let mut cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| CofferError::Crypto(format!("Failed to create cipher: {}", e)))?;

    let mut buf = vec![0u8; CHUNK_SIZE + BLOCK_SIZE];
    let mut filled = 0;
    let mut total: u64 = 0;

    loop {
        let n = read_some(&mut reader, &mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;

        // Hold back the last complete block: it carries the padding and
        // can only be handled once the end of input is known.
        let blocks = filled / BLOCK_SIZE;
        if blocks > 1 {
            let ready = (blocks - 1) * BLOCK_SIZE;
            for block in buf[..ready].chunks_exact_mut(BLOCK_SIZE) {
                cipher.decrypt_block_mut(GenericArray::from_mut_slice(block));
            }
            writer.write_all(&buf[..ready])?;
            total += ready as u64;

            buf.copy_within(ready..filled, 0);
            filled -= ready;
        }
    }

    if filled != BLOCK_SIZE {
        buf.zeroize();
        return Err(CofferError::WrongPasswordOrCorruptData(
            "ciphertext is not a whole number of blocks".into(),
        ));
    }

    let result = match cipher.decrypt_padded_mut::<Pkcs7>(&mut buf[..BLOCK_SIZE]) {
        Ok(tail) => {
            total += tail.len() as u64;
            writer.write_all(tail).map_err(CofferError::from)
        }
        Err(_) => Err(CofferError::WrongPasswordOrCorruptData(
            "invalid padding".into(),
        )),
    };

    buf.zeroize();
    result.map(|()| total)
}

/// Read into `buf`, retrying on interruption
fn read_some<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
