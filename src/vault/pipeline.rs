//! Lock and unlock orchestration.
//!
//! **Lock**: archive the source directory into scratch space, encrypt the
//! archive into an artifact (also in scratch space), then publish the
//! artifact into the vault directory under its canonical name.
//!
//! **Unlock**: pick an artifact, decrypt it into scratch space, then
//! extract the archive into the destination.
//!
//! The vault directory and the unlock destination are only touched by the
//! final step of each operation, so a failure anywhere earlier leaves them
//! as they were.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use super::codec;
use super::naming::{RevisionFile, RevisionIdentity, RevisionKind};
use super::scratch::Scratch;
use super::selector::{self, VaultArtifact};
use crate::archive::Archiver;
use crate::crypto::{self, DerivedKey};
use crate::errors::{Result, VaultError};
use crate::git::RevisionIdProvider;
use crate::prompt::{parse_yes_no, Prompt};

/// Knobs shared by lock and unlock.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Parent directory for scratch space (OS temp dir when `None`).
    pub temp_dir: Option<PathBuf>,
    /// Take the newest artifact without asking when unlocking a directory.
    pub auto_select: bool,
}

/// Lock/unlock driver wired to its archiver.
pub struct VaultPipeline<'a> {
    archiver: &'a dyn Archiver,
    options: PipelineOptions,
}

impl<'a> VaultPipeline<'a> {
    pub fn new(archiver: &'a dyn Archiver, options: PipelineOptions) -> Self {
        Self { archiver, options }
    }

    /// Lock `source` into a new artifact inside `vault_dir`, filed under
    /// the id `revisions` reports for it.
    ///
    /// Returns the path of the published artifact.
    pub fn lock(
        &self,
        source: &Path,
        vault_dir: &Path,
        revisions: &dyn RevisionIdProvider,
        prompt: &mut dyn Prompt,
    ) -> Result<PathBuf> {
        require_dir(source)?;
        ensure_vault_dir(vault_dir, prompt)?;

        let revision_id = revisions
            .head_id(source)
            .ok_or_else(|| VaultError::NoRevisionId(source.to_path_buf()))?;
        let identity = RevisionIdentity::now(revision_id)?;

        let published = RevisionFile::artifact(vault_dir, identity);
        let published_path = published.path();
        if published_path.exists() {
            return Err(VaultError::PathConflict(published_path));
        }

        let scratch = Scratch::create(self.options.temp_dir.as_deref())?;

        let archive_path = published.sibling(RevisionKind::Archive, scratch.path()).path();
        tracing::debug!("Compressing the vault into: {}", archive_path.display());
        self.archiver.archive(source, &archive_path)?;

        let key = crypto::derive_interactive(prompt)?;

        let encrypted_path = published.sibling(RevisionKind::Artifact, scratch.path()).path();
        let mut archive = BufReader::new(File::open(&archive_path)?);
        seal_and_publish(&mut archive, &encrypted_path, &published_path, &key)?;
        drop(key);

        Ok(published_path)
    }

    /// Restore the artifact at `input` into `destination`.
    ///
    /// `input` is either a single artifact file or a vault directory to
    /// choose from.  Returns the destination path.
    pub fn unlock(
        &self,
        input: &Path,
        destination: &Path,
        prompt: &mut dyn Prompt,
    ) -> Result<PathBuf> {
        if destination.symlink_metadata().is_ok() {
            return Err(VaultError::PathConflict(destination.to_path_buf()));
        }

        let artifact = if input.is_dir() {
            selector::select(input, prompt, self.options.auto_select)?
        } else {
            VaultArtifact::open(input)?
        };
        tracing::debug!("unlocking revision file {}", artifact.path().display());

        let key = crypto::derive_interactive(prompt)?;

        let scratch = Scratch::create(self.options.temp_dir.as_deref())?;
        let archive_path = artifact
            .file
            .sibling(RevisionKind::Archive, scratch.path())
            .path();
        tracing::debug!("Decrypting the revision file into: {}", archive_path.display());
        decrypt_file(&artifact.path(), &archive_path, &key)?;
        drop(key);

        tracing::debug!("Uncompressing the vault into: {}", destination.display());
        self.restore(&archive_path, destination)?;

        Ok(destination.to_path_buf())
    }

    /// Extract into a hidden sibling of `destination`, then rename it into
    /// place so a failed extraction never leaves a half-restored tree.
    ///
    /// Parent directories created for the destination are removed again if
    /// extraction fails.
    fn restore(&self, archive_path: &Path, destination: &Path) -> Result<()> {
        let parent = parent_dir(destination);
        let created = create_missing_dirs(&parent)?;

        let staging = parent.join(format!(".{}.partial", display_name(destination)));
        if staging.symlink_metadata().is_ok() {
            return Err(VaultError::PathConflict(staging));
        }

        if let Err(e) = self.archiver.extract(archive_path, &staging) {
            remove_quietly(&staging);
            if let Some(outermost) = created {
                remove_quietly(&outermost);
            }
            return Err(e);
        }

        if destination.symlink_metadata().is_ok() {
            remove_quietly(&staging);
            return Err(VaultError::PathConflict(destination.to_path_buf()));
        }
        if let Err(e) = fs::rename(&staging, destination) {
            remove_quietly(&staging);
            return Err(e.into());
        }
        Ok(())
    }
}

fn require_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(VaultError::NotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(VaultError::invalid_path(path, "not a directory"));
    }
    Ok(())
}

/// Make sure `vault_dir` is a directory, offering to create it.
fn ensure_vault_dir(vault_dir: &Path, prompt: &mut dyn Prompt) -> Result<()> {
    if vault_dir.is_dir() {
        return Ok(());
    }
    if vault_dir.exists() {
        return Err(VaultError::invalid_path(
            vault_dir,
            "exists and is not a vault directory",
        ));
    }

    let question = format!(
        "Vault directory does not exist at: {}. Create? [y/n]",
        vault_dir.display()
    );
    if parse_yes_no(&prompt.ask(&question)?) != Some(true) {
        return Err(VaultError::UserCancelled);
    }

    fs::create_dir_all(vault_dir)?;
    tracing::info!("created vault directory {}", vault_dir.display());
    Ok(())
}

/// Create `dir` and its missing ancestors.  Returns the outermost
/// directory that did not exist before, if any.
fn create_missing_dirs(dir: &Path) -> Result<Option<PathBuf>> {
    let outermost = dir
        .ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && p.symlink_metadata().is_err())
        .last()
        .map(Path::to_path_buf);
    fs::create_dir_all(dir)?;
    Ok(outermost)
}

/// Encode `archive` into the scratch file `staged`, then publish it as
/// `published`.  Nothing reaches the vault unless encoding finished.
fn seal_and_publish<R: Read>(
    archive: &mut R,
    staged: &Path,
    published: &Path,
    key: &DerivedKey,
) -> Result<()> {
    tracing::debug!("Encrypting the vault into: {}", staged.display());
    let mut writer = BufWriter::new(File::create(staged)?);
    codec::encode_stream(archive, &mut writer, key)?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    tracing::debug!("Copying the encrypted file into: {}", published.display());
    publish(staged, published)
}

/// Write `source` to a new file at `path`, readable by the owner only.
fn write_private<R: Read>(source: &mut R, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    io::copy(source, &mut file)?;
    file.sync_all()?;
    Ok(())
}

fn decrypt_file(input: &Path, output: &Path, key: &DerivedKey) -> Result<()> {
    let mut reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);
    codec::decode_stream(&mut reader, &mut writer, key)?;
    writer.into_inner().map_err(|e| e.into_error())?;
    Ok(())
}

/// Copy a finished artifact into the vault without ever exposing a
/// partial file under its final name.
fn publish(from: &Path, to: &Path) -> Result<()> {
    let mut source = File::open(from)?;
    publish_from(&mut source, to)
}

fn publish_from<R: Read>(source: &mut R, to: &Path) -> Result<()> {
    let parent = parent_dir(to);
    let tmp_path = parent.join(format!(".{}.tmp", display_name(to)));

    if let Err(e) = write_private(source, &tmp_path) {
        remove_quietly(&tmp_path);
        return Err(e);
    }

    if to.exists() {
        remove_quietly(&tmp_path);
        return Err(VaultError::PathConflict(to.to_path_buf()));
    }
    if let Err(e) = fs::rename(&tmp_path, to) {
        remove_quietly(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn remove_quietly(path: &Path) {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    if let Err(e) = result {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Removing {} failed: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use crate::vault::codec::CHUNK_LEN;
    use crate::vault::header::HEADER_LEN;
    use tempfile::TempDir;

    #[test]
    fn ensure_vault_dir_creates_on_yes() {
        let tmp = TempDir::new().unwrap();
        let vault = tmp.path().join("vault");
        let mut prompt = ScriptedPrompt::new(["y"]);
        ensure_vault_dir(&vault, &mut prompt).unwrap();
        assert!(vault.is_dir());
        assert!(prompt.asked()[0].contains("Create?"));
    }

    #[test]
    fn ensure_vault_dir_declined_is_cancelled() {
        let tmp = TempDir::new().unwrap();
        let vault = tmp.path().join("vault");
        let mut prompt = ScriptedPrompt::new(["n"]);
        assert!(matches!(
            ensure_vault_dir(&vault, &mut prompt),
            Err(VaultError::UserCancelled)
        ));
        assert!(!vault.exists());
    }

    #[test]
    fn ensure_vault_dir_rejects_file() {
        let tmp = TempDir::new().unwrap();
        let vault = tmp.path().join("vault");
        fs::write(&vault, b"x").unwrap();
        let mut prompt = ScriptedPrompt::default();
        assert!(matches!(
            ensure_vault_dir(&vault, &mut prompt),
            Err(VaultError::InvalidPath { .. })
        ));
    }

    #[test]
    fn publish_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("from.rev");
        let to = tmp.path().join("to.rev");
        fs::write(&from, b"new").unwrap();
        fs::write(&to, b"old").unwrap();

        assert!(matches!(
            publish(&from, &to),
            Err(VaultError::PathConflict(_))
        ));
        assert_eq!(fs::read(&to).unwrap(), b"old");
        assert!(!tmp.path().join(".to.rev.tmp").exists());
    }

    #[test]
    fn publish_copies_without_leftovers() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("from.rev");
        let to = tmp.path().join("to.rev");
        fs::write(&from, b"payload").unwrap();

        publish(&from, &to).unwrap();
        assert_eq!(fs::read(&to).unwrap(), b"payload");
        assert!(from.exists());
        assert!(!tmp.path().join(".to.rev.tmp").exists());
    }

    /// Yields `remaining` bytes, then fails.
    struct FailingReader {
        remaining: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "device went away"));
            }
            let n = buf.len().min(self.remaining);
            buf[..n].fill(0x5a);
            self.remaining -= n;
            Ok(n)
        }
    }

    /// Extraction that leaves half a tree behind before failing.
    struct BrokenArchiver;

    impl Archiver for BrokenArchiver {
        fn archive(&self, _source_dir: &Path, _dest_file: &Path) -> Result<()> {
            Ok(())
        }

        fn extract(&self, _src_file: &Path, dest_dir: &Path) -> Result<()> {
            fs::create_dir_all(dest_dir.join("half"))?;
            Err(VaultError::Archive("corrupt entry".into()))
        }
    }

    fn entries(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect()
    }

    #[test]
    fn interrupted_publish_leaves_vault_empty() {
        let tmp = TempDir::new().unwrap();
        let vault = tmp.path().join("vault");
        fs::create_dir(&vault).unwrap();
        let to = vault.join("abc_20230101T000000.rev");

        let mut source = FailingReader { remaining: 1 << 20 };
        assert!(matches!(
            publish_from(&mut source, &to),
            Err(VaultError::Io(_))
        ));
        assert!(entries(&vault).is_empty(), "{:?}", entries(&vault));
    }

    #[test]
    fn encode_failing_after_frames_publishes_nothing() {
        let tmp = TempDir::new().unwrap();
        let vault = tmp.path().join("vault");
        let scratch = tmp.path().join("scratch");
        fs::create_dir(&vault).unwrap();
        fs::create_dir(&scratch).unwrap();
        let staged = scratch.join("abc_20230101T000000.rev");
        let published = vault.join("abc_20230101T000000.rev");
        let key = crypto::derive_key(b"pw");

        let mut archive = FailingReader {
            remaining: 2 * CHUNK_LEN + 10,
        };
        let result = seal_and_publish(&mut archive, &staged, &published, &key);

        assert!(matches!(result, Err(VaultError::Io(_))));
        assert!(entries(&vault).is_empty());
        // The failure happened after whole frames were already encoded.
        let staged_len = fs::metadata(&staged).unwrap().len() as usize;
        assert!(staged_len > HEADER_LEN + CHUNK_LEN, "staged {staged_len} bytes");
    }

    #[test]
    fn failed_extraction_removes_created_parents() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("abc_20230101T000000.tar.gz");
        fs::write(&archive, b"").unwrap();
        let pipeline = VaultPipeline::new(&BrokenArchiver, PipelineOptions::default());

        let nested = tmp.path().join("a/b/restored");
        assert!(matches!(
            pipeline.restore(&archive, &nested),
            Err(VaultError::Archive(_))
        ));
        assert!(!tmp.path().join("a").exists());

        let flat = tmp.path().join("restored");
        assert!(pipeline.restore(&archive, &flat).is_err());
        assert!(tmp.path().is_dir());
        assert_eq!(entries(tmp.path()), vec![archive]);
    }

    #[test]
    fn create_missing_dirs_reports_outermost_new_dir() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("x/y/z");
        assert_eq!(
            create_missing_dirs(&nested).unwrap(),
            Some(tmp.path().join("x"))
        );
        assert!(nested.is_dir());
        assert_eq!(create_missing_dirs(&nested).unwrap(), None);
    }

    #[test]
    fn parent_dir_of_bare_name_is_cwd() {
        assert_eq!(parent_dir(Path::new("restored")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("/a/b")), PathBuf::from("/a"));
    }
}
