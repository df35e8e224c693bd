use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur while locking or unlocking a vault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Artifact format errors ---
    #[error("Invalid artifact header in {path}: {reason}")]
    InvalidHeader { path: PathBuf, reason: String },

    #[error("Artifact stream is truncated: {0}")]
    Truncated(String),

    // --- Crypto errors ---
    #[error("Failed to get encryption key — password retries exhausted")]
    NoKey,

    #[error("Cipher error: {0}")]
    CipherError(String),

    // --- Revision errors ---
    #[error("No revision id available for {0} — is it an initialized git repository with commits?")]
    NoRevisionId(PathBuf),

    #[error("No valid revision files in {0}")]
    NoCandidates(PathBuf),

    #[error("No revision file was selected")]
    SelectionAborted,

    // --- Path errors ---
    #[error("Path already exists at {0} — refusing to overwrite")]
    PathConflict(PathBuf),

    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    // --- Collaborator errors ---
    #[error("Archive error: {0}")]
    Archive(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// Shorthand for an `InvalidHeader` error.
    pub fn invalid_header(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an `InvalidPath` error.
    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for vault results.
pub type Result<T> = std::result::Result<T, VaultError>;
