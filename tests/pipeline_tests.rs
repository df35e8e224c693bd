//! Integration tests for the lock/unlock pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use bluejay::archive::{Archiver, TarGzArchiver};
use bluejay::errors::{Result, VaultError};
use bluejay::git::{FixedRevision, RevisionIdProvider};
use bluejay::prompt::ScriptedPrompt;
use bluejay::vault::{PipelineOptions, VaultPipeline};
use tempfile::TempDir;

const PASSWORD: &str = "pipeline-password";

/// Test workspace: a source repo, a vault dir and a private temp root.
struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            root: TempDir::new().expect("create temp dir"),
        };
        let src = ws.source();
        fs::create_dir_all(src.join("notes")).unwrap();
        fs::write(src.join("README.md"), "top secret\n").unwrap();
        fs::write(src.join("notes/keys.txt"), "AKIA0000\n").unwrap();
        fs::create_dir_all(ws.vault()).unwrap();
        ws
    }

    fn source(&self) -> PathBuf {
        self.root.path().join("repo")
    }

    fn vault(&self) -> PathBuf {
        self.root.path().join("vault")
    }

    fn scratch_root(&self) -> PathBuf {
        self.root.path().join("tmp")
    }

    fn dest(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    fn options(&self) -> PipelineOptions {
        PipelineOptions {
            temp_dir: Some(self.scratch_root()),
            auto_select: false,
        }
    }

    fn vault_entries(&self) -> Vec<PathBuf> {
        let mut entries: Vec<_> = fs::read_dir(self.vault())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        entries.sort();
        entries
    }
}

fn passwords(pw: &str) -> [String; 2] {
    [pw.to_string(), pw.to_string()]
}

fn lock_with(ws: &Workspace, revision: &str) -> PathBuf {
    let archiver = TarGzArchiver::default();
    let revisions = FixedRevision(revision.to_string());
    let pipeline = VaultPipeline::new(&archiver, ws.options());
    let mut prompt = ScriptedPrompt::new(passwords(PASSWORD));
    pipeline
        .lock(&ws.source(), &ws.vault(), &revisions, &mut prompt)
        .expect("lock should succeed")
}

fn unlock_pipeline<'a>(archiver: &'a TarGzArchiver, ws: &Workspace) -> VaultPipeline<'a> {
    VaultPipeline::new(archiver, ws.options())
}

/// Provider for a directory that is not a repository.
struct NoHead;

impl RevisionIdProvider for NoHead {
    fn head_id(&self, _path: &Path) -> Option<String> {
        None
    }
}

/// Archiver whose output cannot be read back as a byte stream.
struct UnreadableArchiver;

impl Archiver for UnreadableArchiver {
    fn archive(&self, _source_dir: &Path, dest_file: &Path) -> Result<()> {
        fs::create_dir(dest_file)?;
        Ok(())
    }

    fn extract(&self, _src_file: &Path, _dest_dir: &Path) -> Result<()> {
        unreachable!("never extracted")
    }
}

// ---------------------------------------------------------------------------
// Lock
// ---------------------------------------------------------------------------

#[test]
fn lock_then_unlock_restores_tree() {
    let ws = Workspace::new();
    let published = lock_with(&ws, "abc123");

    assert_eq!(published.parent().unwrap(), ws.vault());
    let name = published.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("abc123_") && name.ends_with(".rev"), "{name}");

    let archiver = TarGzArchiver::default();
    let pipeline = unlock_pipeline(&archiver, &ws);
    let dest = ws.dest("restored");
    let mut prompt = ScriptedPrompt::new(passwords(PASSWORD));
    let restored = pipeline.unlock(&published, &dest, &mut prompt).unwrap();

    assert_eq!(restored, dest);
    assert_eq!(fs::read_to_string(dest.join("README.md")).unwrap(), "top secret\n");
    assert_eq!(fs::read_to_string(dest.join("notes/keys.txt")).unwrap(), "AKIA0000\n");
}

#[test]
fn lock_offers_to_create_missing_vault() {
    let ws = Workspace::new();
    let vault = ws.dest("new-vault");

    let archiver = TarGzArchiver::default();
    let revisions = FixedRevision("abc".into());
    let pipeline = VaultPipeline::new(&archiver, ws.options());
    let mut prompt = ScriptedPrompt::new(["y".to_string(), PASSWORD.into(), PASSWORD.into()]);

    let published = pipeline.lock(&ws.source(), &vault, &revisions, &mut prompt).unwrap();
    assert!(published.starts_with(&vault));
    assert!(published.is_file());
}

#[test]
fn lock_without_revision_id_fails_before_prompting() {
    let ws = Workspace::new();
    let archiver = TarGzArchiver::default();
    let pipeline = VaultPipeline::new(&archiver, ws.options());
    let mut prompt = ScriptedPrompt::new(passwords(PASSWORD));

    let result = pipeline.lock(&ws.source(), &ws.vault(), &NoHead, &mut prompt);
    assert!(matches!(result, Err(VaultError::NoRevisionId(_))));
    assert!(prompt.asked().is_empty());
    assert!(ws.vault_entries().is_empty());
}

#[test]
fn lock_with_exhausted_passwords_publishes_nothing() {
    let ws = Workspace::new();
    let archiver = TarGzArchiver::default();
    let revisions = FixedRevision("abc".into());
    let pipeline = VaultPipeline::new(&archiver, ws.options());
    let mut prompt = ScriptedPrompt::new(["a", "b", "c", "d", "e", "f"]);

    let result = pipeline.lock(&ws.source(), &ws.vault(), &revisions, &mut prompt);
    assert!(matches!(result, Err(VaultError::NoKey)));
    assert!(ws.vault_entries().is_empty());
}

#[test]
fn lock_with_unreadable_archive_publishes_nothing() {
    let ws = Workspace::new();
    let revisions = FixedRevision("abc".into());
    let pipeline = VaultPipeline::new(&UnreadableArchiver, ws.options());
    let mut prompt = ScriptedPrompt::new(passwords(PASSWORD));

    assert!(pipeline.lock(&ws.source(), &ws.vault(), &revisions, &mut prompt).is_err());
    assert!(ws.vault_entries().is_empty());
}

#[test]
fn lock_rejects_missing_source() {
    let ws = Workspace::new();
    let archiver = TarGzArchiver::default();
    let revisions = FixedRevision("abc".into());
    let pipeline = VaultPipeline::new(&archiver, ws.options());
    let mut prompt = ScriptedPrompt::default();

    let result = pipeline.lock(&ws.dest("missing"), &ws.vault(), &revisions, &mut prompt);
    assert!(matches!(result, Err(VaultError::NotFound(_))));
}

#[test]
fn scratch_space_is_cleaned_up() {
    let ws = Workspace::new();
    lock_with(&ws, "abc");

    let leftovers: Vec<_> = fs::read_dir(ws.scratch_root()).unwrap().collect();
    assert!(leftovers.is_empty(), "scratch root should be empty");
}

// ---------------------------------------------------------------------------
// Unlock
// ---------------------------------------------------------------------------

#[test]
fn unlock_refuses_existing_destination() {
    let ws = Workspace::new();
    let published = lock_with(&ws, "abc");

    let archiver = TarGzArchiver::default();
    let pipeline = unlock_pipeline(&archiver, &ws);

    let existing_file = ws.dest("taken.txt");
    fs::write(&existing_file, "keep me").unwrap();
    let existing_dir = ws.dest("taken-dir");
    fs::create_dir(&existing_dir).unwrap();
    fs::write(existing_dir.join("inside"), "keep me too").unwrap();

    for dest in [&existing_file, &existing_dir] {
        let mut prompt = ScriptedPrompt::new(passwords(PASSWORD));
        let result = pipeline.unlock(&published, dest, &mut prompt);
        assert!(matches!(result, Err(VaultError::PathConflict(_))));
        assert!(prompt.asked().is_empty());
    }

    assert_eq!(fs::read_to_string(&existing_file).unwrap(), "keep me");
    assert_eq!(
        fs::read_to_string(existing_dir.join("inside")).unwrap(),
        "keep me too"
    );
}

#[test]
fn unlock_with_wrong_password_leaves_no_destination() {
    let ws = Workspace::new();
    let published = lock_with(&ws, "abc");

    let archiver = TarGzArchiver::default();
    let pipeline = unlock_pipeline(&archiver, &ws);
    let dest = ws.dest("restored");
    let mut prompt = ScriptedPrompt::new(passwords("not-the-password"));

    let result = pipeline.unlock(&published, &dest, &mut prompt);
    assert!(matches!(result, Err(VaultError::CipherError(_))));
    assert!(!dest.exists());
}

#[test]
fn unlock_checks_header_before_asking_for_password() {
    let ws = Workspace::new();
    let bogus = ws.vault().join("abc_20230101T000000.rev");
    fs::write(&bogus, b"not an artifact").unwrap();

    let archiver = TarGzArchiver::default();
    let pipeline = unlock_pipeline(&archiver, &ws);
    let mut prompt = ScriptedPrompt::new(passwords(PASSWORD));

    let result = pipeline.unlock(&bogus, &ws.dest("restored"), &mut prompt);
    assert!(matches!(result, Err(VaultError::InvalidHeader { .. })));
    assert!(prompt.asked().is_empty());
}

#[test]
fn unlock_from_directory_walks_candidates_newest_first() {
    let ws = Workspace::new();

    // Older revision holds the original README.
    let first = lock_with(&ws, "aaa");
    let older = ws.vault().join("aaa_20200101T000000.rev");
    fs::rename(&first, &older).unwrap();

    fs::write(ws.source().join("README.md"), "second version\n").unwrap();
    lock_with(&ws, "bbb");

    let archiver = TarGzArchiver::default();
    let pipeline = unlock_pipeline(&archiver, &ws);
    let dest = ws.dest("restored");
    let mut prompt = ScriptedPrompt::new([
        "n".to_string(),
        "y".to_string(),
        PASSWORD.to_string(),
        PASSWORD.to_string(),
    ]);

    pipeline.unlock(&ws.vault(), &dest, &mut prompt).unwrap();
    assert!(prompt.asked()[0].contains("bbb_"));
    assert!(prompt.asked()[1].contains("aaa_20200101T000000.rev"));
    assert_eq!(fs::read_to_string(dest.join("README.md")).unwrap(), "top secret\n");
}

#[test]
fn unlock_auto_select_takes_newest() {
    let ws = Workspace::new();
    let first = lock_with(&ws, "aaa");
    fs::rename(&first, ws.vault().join("aaa_20200101T000000.rev")).unwrap();
    fs::write(ws.source().join("README.md"), "newest\n").unwrap();
    lock_with(&ws, "bbb");

    let archiver = TarGzArchiver::default();
    let options = PipelineOptions {
        auto_select: true,
        ..ws.options()
    };
    let pipeline = VaultPipeline::new(&archiver, options);
    let dest = ws.dest("restored");
    let mut prompt = ScriptedPrompt::new(passwords(PASSWORD));

    pipeline.unlock(&ws.vault(), &dest, &mut prompt).unwrap();
    assert_eq!(fs::read_to_string(dest.join("README.md")).unwrap(), "newest\n");
}

#[test]
fn unlock_empty_vault_has_no_candidates() {
    let ws = Workspace::new();
    let archiver = TarGzArchiver::default();
    let pipeline = unlock_pipeline(&archiver, &ws);
    let mut prompt = ScriptedPrompt::default();

    let result = pipeline.unlock(&ws.vault(), &ws.dest("restored"), &mut prompt);
    assert!(matches!(result, Err(VaultError::NoCandidates(_))));
}
