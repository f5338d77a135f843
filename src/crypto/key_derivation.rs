//! Key derivation using PBKDF2-HMAC-SHA256
//!
//! Derives the 32-byte AES-256 file key from the master password and the
//! per-file salt stored in the encrypted file header. The work factor is a
//! fixed constant: writer and reader must agree on it, so it is never read
//! from configuration.

use std::fmt;

use hmac::Hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CofferError, CofferResult};

/// Size of the per-file salt in bytes
pub const SALT_SIZE: usize = 16;

/// Size of the derived key in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// A derived encryption key
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    /// The 32-byte key for AES-256
    key: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

// Never print key material
impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey").finish_non_exhaustive()
    }
}

/// Generate a fresh random salt from the operating system CSPRNG
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive an encryption key from a password and salt
pub fn derive_key(password: &str, salt: &[u8; SALT_SIZE]) -> CofferResult<DerivedKey> {
    let mut key = [0u8; KEY_SIZE];

    pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key)
        .map_err(|e| CofferError::Crypto(format!("Key derivation failed: {}", e)))?;

    Ok(DerivedKey { key })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key() {
        let salt = generate_salt();
        let key = derive_key("test_password", &salt).unwrap();
        assert_eq!(key.as_bytes().len(), KEY_SIZE);
    }

    #[test]
    fn test_same_password_same_key() {
        let salt = generate_salt();
        let key1 = derive_key("test_password", &salt).unwrap();
        let key2 = derive_key("test_password", &salt).unwrap();
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_password_different_key() {
        let salt = generate_salt();
        let key1 = derive_key("password1", &salt).unwrap();
        let key2 = derive_key("password2", &salt).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let key1 = derive_key("same_password", &[1u8; SALT_SIZE]).unwrap();
        let key2 = derive_key("same_password", &[2u8; SALT_SIZE]).unwrap();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_known_answer() {
        // Same parameters as OpenSSL PKCS5_PBKDF2_HMAC with EVP_sha256()
        let key = derive_key("correct horse battery staple", b"coffer-test-salt").unwrap();
        assert_eq!(
            hex::encode(key.as_bytes()),
            "78fa144cae2faa1734e17fb2ba88e8d329a20da3dd83fea759847d4a3baad353"
        );
    }

    #[test]
    fn test_salts_are_random() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = derive_key("pw", &[0u8; SALT_SIZE]).unwrap();
        let debug = format!("{:?}", key);
        assert_eq!(debug, "DerivedKey { .. }");
    }
}
