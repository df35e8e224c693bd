//! Git integration — naming revisions after the repository's HEAD commit.

use std::path::Path;
use std::process::{Command, Stdio};

/// Supplies the revision id a locked directory is filed under.
pub trait RevisionIdProvider {
    /// The current head identifier of `path`, or `None` if it has none
    /// (not a repository, no commits yet, tool unavailable).
    fn head_id(&self, path: &Path) -> Option<String>;
}

/// Reads `HEAD` with the `git` executable.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHead;

impl RevisionIdProvider for GitHead {
    fn head_id(&self, path: &Path) -> Option<String> {
        if !path.join(".git").exists() {
            tracing::debug!("{} is not the root of a git work tree", path.display());
            return None;
        }

        let output = Command::new("git")
            .arg("-C")
            .arg(path)
            .args(["rev-parse", "--verify", "--quiet", "HEAD"])
            .stdin(Stdio::null())
            .output();

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!("failed to run git: {e}");
                return None;
            }
        };

        if !output.status.success() {
            tracing::debug!(
                "git rev-parse HEAD in {} exited with {}",
                path.display(),
                output.status
            );
            return None;
        }

        let head = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if head.is_empty() {
            None
        } else {
            Some(head)
        }
    }
}

/// Always reports the same revision id, for directories that are not
/// repositories.
#[derive(Debug, Clone)]
pub struct FixedRevision(pub String);

impl RevisionIdProvider for FixedRevision {
    fn head_id(&self, _path: &Path) -> Option<String> {
        Some(self.0.clone())
    }
}
