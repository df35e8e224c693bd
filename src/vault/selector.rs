//! Finding and choosing revision artifacts in a vault directory.

use std::fs;
use std::path::{Path, PathBuf};

use super::header;
use super::naming::{RevisionFile, RevisionKind};
use crate::errors::{Result, VaultError};
use crate::prompt::{parse_yes_no, Prompt};

/// A revision artifact whose name and header have both been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultArtifact {
    pub file: RevisionFile,
    /// Format version read from the header.
    pub version: u8,
    /// Size on disk in bytes.
    pub size: u64,
}

impl VaultArtifact {
    /// Validate a single file as an artifact.
    ///
    /// The name must parse with the artifact extension and the header must
    /// pass `header::read_from`.
    pub fn open(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VaultError::NotFound(path.to_path_buf()),
            _ => VaultError::Io(e),
        })?;
        if !meta.is_file() {
            return Err(VaultError::invalid_path(path, "not a regular file"));
        }

        let file = RevisionFile::from_path_as(path, RevisionKind::Artifact).ok_or_else(|| {
            VaultError::invalid_path(
                path,
                format!(
                    "expected a name like <revision>_<timestamp>.{}",
                    RevisionKind::ARTIFACT_EXT
                ),
            )
        })?;
        let version = header::read_from(path)?;

        Ok(Self {
            file,
            version,
            size: meta.len(),
        })
    }

    pub fn path(&self) -> PathBuf {
        self.file.path()
    }

    pub fn timestamp(&self) -> &str {
        &self.file.identity.timestamp
    }
}

/// Lazy, depth-first walk over a vault directory yielding valid artifacts.
///
/// Entries of each directory are visited in name order.  Anything that
/// cannot be read or does not validate is skipped.
pub struct Scan {
    pending: Vec<std::vec::IntoIter<PathBuf>>,
}

/// Start scanning `vault_dir`.
pub fn scan(vault_dir: &Path) -> Result<Scan> {
    if !vault_dir.is_dir() {
        return Err(VaultError::NotFound(vault_dir.to_path_buf()));
    }
    let entries = sorted_entries(vault_dir)?;
    Ok(Scan {
        pending: vec![entries.into_iter()],
    })
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        match entry {
            Ok(entry) => entries.push(entry.path()),
            Err(e) => tracing::debug!("skipping unreadable entry in {}: {e}", dir.display()),
        }
    }
    entries.sort();
    Ok(entries)
}

impl Iterator for Scan {
    type Item = VaultArtifact;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let path = match self.pending.last_mut()?.next() {
                Some(path) => path,
                None => {
                    self.pending.pop();
                    continue;
                }
            };

            let Ok(file_type) = fs::symlink_metadata(&path).map(|m| m.file_type()) else {
                tracing::debug!("skipping {}: cannot stat", path.display());
                continue;
            };

            if file_type.is_dir() {
                match sorted_entries(&path) {
                    Ok(entries) => self.pending.push(entries.into_iter()),
                    Err(e) => tracing::debug!("skipping directory {}: {e}", path.display()),
                }
                continue;
            }

            if !path.is_file() {
                continue;
            }

            match VaultArtifact::open(&path) {
                Ok(artifact) => return Some(artifact),
                Err(e) => tracing::debug!("not a revision artifact: {e}"),
            }
        }
    }
}

/// Order candidates newest first.
///
/// Timestamps are compared as plain strings; equal timestamps keep their
/// scan order.  Fails with `NoCandidates` if there is nothing to order.
pub fn select_latest<I>(candidates: I, vault_dir: &Path) -> Result<Vec<VaultArtifact>>
where
    I: IntoIterator<Item = VaultArtifact>,
{
    let mut sorted: Vec<VaultArtifact> = candidates.into_iter().collect();
    if sorted.is_empty() {
        return Err(VaultError::NoCandidates(vault_dir.to_path_buf()));
    }
    sorted.sort_by(|a, b| b.timestamp().cmp(a.timestamp()));
    Ok(sorted)
}

/// Walk the sorted candidates asking the user to accept each in turn.
///
/// "y" accepts, "n" moves to the next candidate, anything else aborts.
pub fn choose(candidates: Vec<VaultArtifact>, prompt: &mut dyn Prompt) -> Result<VaultArtifact> {
    for candidate in candidates {
        let question = format!(
            "Use the revision file {}? [y/n]",
            candidate.path().display()
        );
        match parse_yes_no(&prompt.ask(&question)?) {
            Some(true) => return Ok(candidate),
            Some(false) => continue,
            None => break,
        }
    }

    tracing::error!("Failed to get latest revision file");
    Err(VaultError::SelectionAborted)
}

/// Scan `vault_dir` and pick one artifact.
///
/// With `auto_latest` the newest candidate is taken without asking.
pub fn select(
    vault_dir: &Path,
    prompt: &mut dyn Prompt,
    auto_latest: bool,
) -> Result<VaultArtifact> {
    let sorted = select_latest(scan(vault_dir)?, vault_dir)?;
    tracing::debug!("{} candidate revision(s) in {}", sorted.len(), vault_dir.display());

    if auto_latest {
        return sorted
            .into_iter()
            .next()
            .ok_or_else(|| VaultError::NoCandidates(vault_dir.to_path_buf()));
    }
    choose(sorted, prompt)
}
