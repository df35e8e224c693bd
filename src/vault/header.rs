//! The 4-byte header at the start of every revision artifact.
//!
//! The header is a little-endian `u32` packed as
//! `(MAGIC0 << 24) | (MAGIC1 << 16) | (MAGIC2 << 8) | VERSION`,
//! so on disk the bytes read `[VERSION, MAGIC2, MAGIC1, MAGIC0]`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::errors::{Result, VaultError};

/// Size of the encoded header in bytes.
pub const HEADER_LEN: usize = 4;

const MAGIC0: u8 = b'b';
const MAGIC1: u8 = b'j';
const MAGIC2: u8 = b'r';

/// Format version written by this build.
pub const CURRENT_VERSION: u8 = 1;

/// Highest format version this build can read.
pub const MAX_SUPPORTED_VERSION: u8 = 1;

/// Reason a header was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeaderFault {
    #[error("expected 4 header bytes, found {0}")]
    TooShort(usize),

    #[error("magic bytes do not match")]
    BadMagic,

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
}

/// Encode the header for the current format version.
pub fn encode() -> [u8; HEADER_LEN] {
    let packed = (u32::from(MAGIC0) << 24)
        | (u32::from(MAGIC1) << 16)
        | (u32::from(MAGIC2) << 8)
        | u32::from(CURRENT_VERSION);
    packed.to_le_bytes()
}

/// Decode a header and return its format version.
///
/// Only the first `HEADER_LEN` bytes of `bytes` are inspected.
pub fn decode(bytes: &[u8]) -> std::result::Result<u8, HeaderFault> {
    let raw: [u8; HEADER_LEN] = bytes
        .get(..HEADER_LEN)
        .and_then(|b| b.try_into().ok())
        .ok_or(HeaderFault::TooShort(bytes.len()))?;
    let packed = u32::from_le_bytes(raw);

    let [magic0, magic1, magic2, version] = packed.to_be_bytes();
    if (magic0, magic1, magic2) != (MAGIC0, MAGIC1, MAGIC2) {
        return Err(HeaderFault::BadMagic);
    }
    if version > MAX_SUPPORTED_VERSION {
        return Err(HeaderFault::UnsupportedVersion(version));
    }

    Ok(version)
}

/// Read and decode the header at the start of the file at `path`.
///
/// This is cheap and runs before any password is requested, so a file
/// that cannot be an artifact is rejected up front.
pub fn read_from(path: &Path) -> Result<u8> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(HEADER_LEN);
    file.take(HEADER_LEN as u64).read_to_end(&mut buf)?;

    decode(&buf).map_err(|fault| VaultError::invalid_header(path, fault.to_string()))
}
