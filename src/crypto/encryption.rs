//! AES-256-GCM authenticated encryption of a single chunk.
//!
//! Each call to `seal` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  `open` splits the nonce back out
//! before decrypting.
//!
//! Layout of a sealed chunk:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use crate::errors::{Result, VaultError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Bytes a sealed chunk carries on top of its plaintext.
pub const SEAL_OVERHEAD: usize = NONCE_LEN + TAG_LEN;

/// An AES-256-GCM cipher keyed once and reused for every chunk of a stream.
pub struct ChunkCipher {
    cipher: Aes256Gcm,
}

impl ChunkCipher {
    /// Build the cipher from raw 32-byte key material.
    pub fn new(key: &[u8]) -> Result<Self> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| VaultError::CipherError(format!("invalid key length: {e}")))?;
        Ok(Self { cipher })
    }

    /// Encrypt and authenticate one chunk.
    ///
    /// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| VaultError::CipherError(format!("encryption error: {e}")))?;

        let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    /// Decrypt a chunk produced by `seal`.
    ///
    /// A wrong key and a tampered chunk are indistinguishable here: both
    /// fail the tag check.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < SEAL_OVERHEAD {
            return Err(VaultError::CipherError(format!(
                "sealed chunk of {} bytes is shorter than nonce and tag",
                sealed.len()
            )));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher.decrypt(nonce, ciphertext).map_err(|_| {
            VaultError::CipherError(
                "decryption failed — wrong password or corrupted artifact".into(),
            )
        })
    }
}
