//! `bluejay lock` — archive, encrypt and publish a new vault revision.

use crate::archive::TarGzArchiver;
use crate::cli::output;
use crate::cli::prompt::TerminalPrompt;
use crate::cli::{load_settings, resolve_vault};
use crate::errors::Result;
use crate::git::{FixedRevision, GitHead, RevisionIdProvider};
use crate::vault::VaultPipeline;

/// Execute the `lock` command.
pub fn execute(source: &str, vault: Option<&str>, revision: Option<&str>) -> Result<()> {
    let (cwd, settings) = load_settings()?;
    let source = cwd.join(source);
    let vault_dir = resolve_vault(vault, &settings, &cwd);

    let archiver = TarGzArchiver::new(settings.compression_level);
    let fixed;
    let revisions: &dyn RevisionIdProvider = match revision {
        Some(id) => {
            fixed = FixedRevision(id.to_string());
            &fixed
        }
        None => &GitHead,
    };

    let pipeline = VaultPipeline::new(&archiver, settings.pipeline_options());
    let mut prompt = TerminalPrompt::new();
    let published = pipeline.lock(&source, &vault_dir, revisions, &mut prompt)?;

    output::success(&format!("Output file: {}", published.display()));
    output::tip("Run `bluejay unlock <DIR>` to restore it.");
    Ok(())
}
