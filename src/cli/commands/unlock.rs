//! `bluejay unlock` — pick a vault revision, decrypt it and restore it.

use crate::archive::TarGzArchiver;
use crate::cli::output;
use crate::cli::prompt::TerminalPrompt;
use crate::cli::{load_settings, resolve_vault};
use crate::errors::Result;
use crate::vault::VaultPipeline;

/// Execute the `unlock` command.
pub fn execute(destination: &str, vault: Option<&str>, latest: bool) -> Result<()> {
    let (cwd, settings) = load_settings()?;
    let input = resolve_vault(vault, &settings, &cwd);
    let destination = cwd.join(destination);

    let mut options = settings.pipeline_options();
    options.auto_select |= latest;

    let archiver = TarGzArchiver::new(settings.compression_level);
    let pipeline = VaultPipeline::new(&archiver, options);
    let mut prompt = TerminalPrompt::new();
    let restored = pipeline.unlock(&input, &destination, &mut prompt)?;

    output::success(&format!("Output git repo: {}", restored.display()));
    Ok(())
}
