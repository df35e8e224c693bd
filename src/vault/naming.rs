//! Canonical names for revision files.
//!
//! Every file the vault produces is named
//! `<dir>/<revision_id>_<timestamp>.<ext>`, where the extension is fixed by
//! the file's kind.  Parsing goes the other way: the text before the first
//! `.` is the stem, the rest is the extension, and the stem must split on
//! `_` into exactly two fields.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::errors::{Result, VaultError};

/// Timestamp layout; fixed width so string order is chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

const FIELD_SEPARATOR: char = '_';

/// What a revision file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevisionKind {
    /// The packed source directory, before encryption.
    Archive,
    /// The encrypted, framed artifact stored in the vault.
    Artifact,
}

impl RevisionKind {
    pub const ARCHIVE_EXT: &'static str = "tar.gz";
    pub const ARTIFACT_EXT: &'static str = "rev";

    pub fn extension(self) -> &'static str {
        match self {
            Self::Archive => Self::ARCHIVE_EXT,
            Self::Artifact => Self::ARTIFACT_EXT,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            Self::ARCHIVE_EXT => Some(Self::Archive),
            Self::ARTIFACT_EXT => Some(Self::Artifact),
            _ => None,
        }
    }
}

/// The `(revision_id, timestamp)` pair naming one lock operation's output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionIdentity {
    pub revision_id: String,
    pub timestamp: String,
}

impl RevisionIdentity {
    /// Build an identity, rejecting fields that would not survive a
    /// round-trip through a file name.
    pub fn new(revision_id: impl Into<String>, timestamp: impl Into<String>) -> Result<Self> {
        let revision_id = revision_id.into();
        let timestamp = timestamp.into();
        validate_field("revision id", &revision_id)?;
        validate_field("timestamp", &timestamp)?;
        Ok(Self {
            revision_id,
            timestamp,
        })
    }

    /// Identity for `revision_id` stamped with the current local time.
    pub fn now(revision_id: impl Into<String>) -> Result<Self> {
        Self::at(revision_id, Local::now())
    }

    /// Identity for `revision_id` stamped with `when`.
    pub fn at(revision_id: impl Into<String>, when: DateTime<Local>) -> Result<Self> {
        Self::new(revision_id, when.format(TIMESTAMP_FORMAT).to_string())
    }
}

impl fmt::Display for RevisionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{FIELD_SEPARATOR}{}", self.revision_id, self.timestamp)
    }
}

fn validate_field(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(VaultError::CommandFailed(format!("{what} cannot be empty")));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| *c == FIELD_SEPARATOR || *c == '.' || std::path::is_separator(*c))
    {
        return Err(VaultError::CommandFailed(format!(
            "{what} '{value}' cannot contain '{bad}'"
        )));
    }
    Ok(())
}

/// Join the canonical path `<dir>/<revision_id>_<timestamp>.<ext>`.
pub fn to_path(dir: &Path, revision_id: &str, timestamp: &str, ext: &str) -> Result<PathBuf> {
    for (what, value) in [
        ("revision id", revision_id),
        ("timestamp", timestamp),
        ("extension", ext),
    ] {
        if value.is_empty() {
            return Err(VaultError::CommandFailed(format!("{what} cannot be empty")));
        }
    }
    Ok(dir.join(format!("{revision_id}{FIELD_SEPARATOR}{timestamp}.{ext}")))
}

/// A file name split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub dir: PathBuf,
    pub identity: RevisionIdentity,
    pub extension: String,
}

/// Split `path` into directory, identity and extension.
///
/// Returns `None` when the stem does not have the `<id>_<timestamp>`
/// shape; such files are simply not revision files.
pub fn from_path(path: &Path) -> Option<ParsedName> {
    let basename = path.file_name()?.to_str()?;
    let (stem, extension) = basename.split_once('.').unwrap_or((basename, ""));

    let mut fields = stem.split(FIELD_SEPARATOR);
    let revision_id = fields.next()?;
    let timestamp = fields.next()?;
    if fields.next().is_some() || revision_id.is_empty() || timestamp.is_empty() {
        return None;
    }

    Some(ParsedName {
        dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        identity: RevisionIdentity {
            revision_id: revision_id.to_string(),
            timestamp: timestamp.to_string(),
        },
        extension: extension.to_string(),
    })
}

/// A revision file of a known kind in a known directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionFile {
    pub kind: RevisionKind,
    pub dir: PathBuf,
    pub identity: RevisionIdentity,
}

impl RevisionFile {
    pub fn archive(dir: impl Into<PathBuf>, identity: RevisionIdentity) -> Self {
        Self {
            kind: RevisionKind::Archive,
            dir: dir.into(),
            identity,
        }
    }

    pub fn artifact(dir: impl Into<PathBuf>, identity: RevisionIdentity) -> Self {
        Self {
            kind: RevisionKind::Artifact,
            dir: dir.into(),
            identity,
        }
    }

    /// Parse `path` as a revision file of any known kind.
    pub fn from_path(path: &Path) -> Option<Self> {
        let parsed = from_path(path)?;
        let kind = RevisionKind::from_extension(&parsed.extension)?;
        Some(Self {
            kind,
            dir: parsed.dir,
            identity: parsed.identity,
        })
    }

    /// Parse `path`, accepting only the given kind.
    pub fn from_path_as(path: &Path, kind: RevisionKind) -> Option<Self> {
        Self::from_path(path).filter(|f| f.kind == kind)
    }

    /// The same identity as a file of another kind in another directory.
    pub fn sibling(&self, kind: RevisionKind, dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            dir: dir.into(),
            identity: self.identity.clone(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.identity, self.kind.extension())
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(self.file_name())
    }
}
