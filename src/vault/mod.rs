//! Vault module — revision artifacts and the lock/unlock pipeline.
//!
//! This module provides:
//! - The 4-byte artifact header (`header`)
//! - Chunked, framed encryption of a byte stream (`codec`)
//! - Canonical revision file names (`naming`)
//! - Scanning and choosing artifacts in a vault directory (`selector`)
//! - Per-invocation scratch space (`scratch`)
//! - Lock and unlock orchestration (`pipeline`)

pub mod codec;
pub mod header;
pub mod naming;
pub mod pipeline;
pub mod scratch;
pub mod selector;

// Re-export the most commonly used items.
pub use codec::{decode_stream, encode_stream, CHUNK_LEN};
pub use naming::{RevisionFile, RevisionIdentity, RevisionKind};
pub use pipeline::{PipelineOptions, VaultPipeline};
pub use scratch::Scratch;
pub use selector::VaultArtifact;
