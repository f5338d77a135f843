//! Cryptographic functions for Coffer
//!
//! Provides the password-based file encryption used for every file Coffer
//! persists: PBKDF2-HMAC-SHA256 key derivation and streaming AES-256-CBC.

pub mod file_cipher;
pub mod key_derivation;
pub mod secure_memory;

pub use file_cipher::{decrypt_file, decrypt_stream, encrypt_file, encrypt_stream, HEADER_SIZE};
pub use key_derivation::{derive_key, generate_salt, DerivedKey, PBKDF2_ITERATIONS};
pub use secure_memory::{SecureBytes, SecureString};
