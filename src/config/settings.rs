use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};
use crate::vault::PipelineOptions;

/// Project-level configuration, loaded from `.bluejay.toml`.
///
/// Every field has a sensible default so the tool works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Vault directory used when no `--vault` is given.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,

    /// Parent directory for scratch space (default: the OS temp dir).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<String>,

    /// Unlock the newest revision without asking for confirmation.
    #[serde(default)]
    pub auto_select: bool,

    /// Gzip level for archives, 0 (store) to 9 (best).
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_dir() -> String {
    "vault".to_string()
}

fn default_compression_level() -> u32 {
    6
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            temp_dir: None,
            auto_select: false,
            compression_level: default_compression_level(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the working directory.
    pub const FILE_NAME: &'static str = ".bluejay.toml";

    /// Load settings from `<project_dir>/.bluejay.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.compression_level > 9 {
            return Err(VaultError::Config(format!(
                "compression_level must be between 0 and 9 (got {})",
                settings.compression_level
            )));
        }

        Ok(settings)
    }

    /// Resolve the vault directory relative to `project_dir`.
    pub fn vault_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_dir)
    }

    /// Convert into pipeline options.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            temp_dir: self.temp_dir.as_ref().map(PathBuf::from),
            auto_select: self.auto_select,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
