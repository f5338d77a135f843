//! Secure memory handling for sensitive data
//!
//! Master passwords, vault secrets and decrypted plaintext are wiped when
//! dropped.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string that zeros its contents on drop
///
/// Holds the master password and stored vault passwords.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    pub fn new(s: impl Into<String>) -> Self {
        Self { inner: s.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureString([REDACTED])")
    }
}

/// Decrypted plaintext, zeroed on drop
#[derive(Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureBytes {
    inner: Vec<u8>,
}

impl SecureBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// The underlying buffer, as a `read_to_end` target
    pub fn as_vec_mut(&mut self) -> &mut Vec<u8> {
        &mut self.inner
    }
}

impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureBytes({} bytes)", self.inner.len())
    }
}
