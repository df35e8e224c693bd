//! Chunked, framed encryption of a byte stream.
//!
//! An artifact body has this layout:
//!
//! ```text
//! [header: 4 bytes][len: 4 bytes LE][sealed chunk: len bytes][len][sealed chunk]...
//! ```
//!
//! - **Header**: see `vault::header`.
//! - **Frame**: one sealed chunk (`crypto::encryption`) behind a
//!   little-endian `u32` length prefix.
//!
//! Plaintext is cut into chunks of at most `CHUNK_LEN` bytes and every
//! chunk is authenticated on its own, so damage to one frame only
//! invalidates that frame.

use std::io::{self, Read, Write};

use super::header;
use crate::crypto::{ChunkCipher, DerivedKey};
use crate::errors::{Result, VaultError};

/// Maximum plaintext bytes per chunk (64 KiB).
pub const CHUNK_LEN: usize = 1 << 16;

/// Size of a frame's length prefix.
const LEN_PREFIX: usize = 4;

/// Counters reported by `encode_stream`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeSummary {
    pub frames: u64,
    pub plaintext_bytes: u64,
}

/// Counters reported by `decode_stream`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    pub frames: u64,
    pub plaintext_bytes: u64,
}

/// Encrypt everything `reader` yields into `writer` as an artifact.
///
/// On error the writer may already hold a partial artifact; the caller
/// must discard it.
pub fn encode_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    key: &DerivedKey,
) -> Result<EncodeSummary> {
    let cipher = ChunkCipher::new(key.as_bytes())?;
    let mut summary = EncodeSummary::default();

    writer.write_all(&header::encode())?;

    let mut chunk = vec![0u8; CHUNK_LEN];
    loop {
        let n = read_full(reader, &mut chunk)?;
        if n == 0 {
            break;
        }

        let sealed = cipher.seal(&chunk[..n])?;
        let len = u32::try_from(sealed.len()).map_err(|_| {
            VaultError::CipherError(format!(
                "sealed chunk length {} exceeds u32::MAX",
                sealed.len()
            ))
        })?;

        writer.write_all(&len.to_le_bytes())?;
        writer.write_all(&sealed)?;

        summary.frames += 1;
        summary.plaintext_bytes += n as u64;
    }

    writer.flush()?;
    tracing::debug!(
        frames = summary.frames,
        bytes = summary.plaintext_bytes,
        "encoded artifact stream"
    );
    Ok(summary)
}

/// Decrypt an artifact from `reader`, writing the plaintext to `writer`.
///
/// The header is skipped without inspection; callers validate it first
/// with `header::read_from` or `header::decode`.
pub fn decode_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    key: &DerivedKey,
) -> Result<DecodeSummary> {
    let cipher = ChunkCipher::new(key.as_bytes())?;
    let mut summary = DecodeSummary::default();

    let mut header_buf = [0u8; header::HEADER_LEN];
    let n = read_full(reader, &mut header_buf)?;
    if n < header::HEADER_LEN {
        return Err(VaultError::Truncated(format!(
            "artifact ends inside its header ({n} of {} bytes)",
            header::HEADER_LEN
        )));
    }

    let mut sealed = Vec::new();
    loop {
        let mut len_buf = [0u8; LEN_PREFIX];
        match read_full(reader, &mut len_buf)? {
            0 => break,
            LEN_PREFIX => {}
            partial => {
                return Err(VaultError::Truncated(format!(
                    "frame {} has a {partial}-byte length prefix",
                    summary.frames + 1
                )));
            }
        }

        let len = u32::from_le_bytes(len_buf) as usize;
        sealed.clear();
        let got = reader.by_ref().take(len as u64).read_to_end(&mut sealed)?;
        if got < len {
            return Err(VaultError::Truncated(format!(
                "frame {} declares {len} bytes but only {got} remain",
                summary.frames + 1
            )));
        }

        let plaintext = cipher.open(&sealed).map_err(|e| match e {
            VaultError::CipherError(msg) => {
                VaultError::CipherError(format!("frame {}: {msg}", summary.frames + 1))
            }
            other => other,
        })?;
        writer.write_all(&plaintext)?;

        summary.frames += 1;
        summary.plaintext_bytes += plaintext.len() as u64;
    }

    writer.flush()?;
    tracing::debug!(
        frames = summary.frames,
        bytes = summary.plaintext_bytes,
        "decoded artifact stream"
    );
    Ok(summary)
}

/// Read until `buf` is full or the reader is exhausted.
///
/// Returns the number of bytes read; fewer than `buf.len()` means end of
/// stream was reached.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
