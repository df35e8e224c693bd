//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;
pub mod prompt;

use std::path::{Path, PathBuf};

use clap::Parser;
use clap_complete::Shell;

use crate::config::Settings;
use crate::errors::Result;

/// Environment variable that supplies the password non-interactively.
pub const PASSWORD_ENV: &str = "BLUEJAY_PASSWORD";

/// Environment variable holding the log filter (e.g. `debug`).
pub const LOG_ENV: &str = "BLUEJAY_LOG";

/// Bluejay: encrypted, versioned snapshots of a repository.
#[derive(Parser)]
#[command(
    name = "bluejay",
    about = "Lock a repository into an encrypted vault revision and unlock it again",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Archive and encrypt a repository into a new vault revision
    Lock {
        /// Repository to lock (default: current directory)
        #[arg(default_value = ".")]
        source: String,

        /// Vault directory (default: `vault_dir` from .bluejay.toml)
        #[arg(long)]
        vault: Option<String>,

        /// Revision id to use instead of the repository's git HEAD
        #[arg(long)]
        revision: Option<String>,
    },

    /// Decrypt a vault revision and restore it into a new directory
    Unlock {
        /// Directory to restore into (must not exist yet)
        destination: String,

        /// Vault directory to choose from, or a single .rev file
        #[arg(long)]
        vault: Option<String>,

        /// Take the newest revision without asking
        #[arg(long)]
        latest: bool,
    },

    /// List the revisions stored in a vault, newest first
    List {
        /// Vault directory (default: `vault_dir` from .bluejay.toml)
        #[arg(long)]
        vault: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Print a shell completion script to stdout
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load `.bluejay.toml` from the current directory.
///
/// Returns the directory alongside the settings so relative paths can be
/// resolved against it.
pub fn load_settings() -> Result<(PathBuf, Settings)> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    Ok((cwd, settings))
}

/// Pick the vault path: the `--vault` flag if given, else the configured
/// vault directory.  Relative paths are resolved against `cwd`.
pub fn resolve_vault(flag: Option<&str>, settings: &Settings, cwd: &Path) -> PathBuf {
    match flag {
        Some(path) => cwd.join(path),
        None => settings.vault_path(cwd),
    }
}

/// Install the stderr log subscriber.
///
/// `BLUEJAY_LOG` takes precedence; otherwise `--verbose` selects `debug`
/// and the default is `warn`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
