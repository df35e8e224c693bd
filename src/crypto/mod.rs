//! Cryptographic primitives.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption of single chunks (`encryption`)
//! - PBKDF2 password-based key derivation with retry policy (`kdf`)
//! - The zeroizing `DerivedKey` holder (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

pub use encryption::ChunkCipher;
pub use kdf::{derive_interactive, derive_key};
pub use keys::DerivedKey;
