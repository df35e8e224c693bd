//! Per-invocation scratch directory for intermediate archives and artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::errors::Result;

const SCRATCH_PREFIX: &str = "bluejay-";

/// A temporary directory that lives for one lock or unlock.
///
/// The directory and everything in it are removed when the value is
/// dropped, whichever way the operation ends.  Removal failures are
/// logged and otherwise ignored.
pub struct Scratch {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Scratch {
    /// Create a fresh scratch directory under `parent`, or under the OS
    /// temp dir when `parent` is `None`.
    pub fn create(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);

        let dir = match parent {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };

        let path = dir.path().to_path_buf();
        tracing::debug!("created scratch directory {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => tracing::debug!("removed scratch directory {}", self.path.display()),
                Err(e) => tracing::warn!(
                    "Removing scratch directory {} failed: {e}",
                    self.path.display()
                ),
            }
        }
    }
}
