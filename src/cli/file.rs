//! Standalone file commands
//!
//! Direct access to the file cipher and the Huffman codec, independent of
//! the data directory.

use std::path::PathBuf;

use clap::Subcommand;

use super::password::{env_password, prompt_new_password, prompt_password};
use crate::compression::{compress_file, decompress_file};
use crate::crypto::{decrypt_file, encrypt_file};
use crate::error::CofferResult;

/// File subcommands
#[derive(Subcommand)]
pub enum FileCommands {
    /// Encrypt a file with a password (AES-256-CBC, PBKDF2 key)
    Encrypt {
        /// File to encrypt
        input: PathBuf,
        /// Destination of the encrypted file
        output: PathBuf,
    },
    /// Decrypt a file produced by `file encrypt`
    Decrypt {
        /// Encrypted file
        input: PathBuf,
        /// Destination of the plaintext
        output: PathBuf,
    },
    /// Huffman-compress a file
    Compress {
        /// File to compress
        input: PathBuf,
        /// Destination archive
        output: PathBuf,
    },
    /// Decompress a Huffman archive
    Decompress {
        /// Archive to decompress
        input: PathBuf,
        /// Destination of the decompressed data
        output: PathBuf,
    },
}

/// Handle a file command
pub fn handle_file_command(cmd: FileCommands) -> CofferResult<()> {
    match cmd {
        FileCommands::Encrypt { input, output } => {
            let password = match env_password() {
                Some(p) => p,
                None => prompt_new_password("File password: ")?,
            };
            encrypt_file(&input, &output, password.as_str())?;
            println!("Encrypted {} -> {}", input.display(), output.display());
        }

        FileCommands::Decrypt { input, output } => {
            let password = match env_password() {
                Some(p) => p,
                None => prompt_password("File password: ")?,
            };
            if let Err(e) = decrypt_file(&input, &output, password.as_str()) {
                // Partial plaintext is never left behind
                let _ = std::fs::remove_file(&output);
                return Err(e);
            }
            println!("Decrypted {} -> {}", input.display(), output.display());
        }

        FileCommands::Compress { input, output } => {
            let stats = compress_file(&input, &output)?;
            println!(
                "Compressed {} -> {} ({} bytes -> {} bytes)",
                input.display(),
                output.display(),
                stats.input_bytes,
                stats.output_bytes
            );
        }

        FileCommands::Decompress { input, output } => {
            let written = decompress_file(&input, &output)?;
            println!(
                "Decompressed {} -> {} ({} bytes)",
                input.display(),
                output.display(),
                written
            );
        }
    }

    Ok(())
}
