//! `bluejay list` — show the revisions stored in a vault.

use comfy_table::{ContentArrangement, Table};
use serde::Serialize;

use crate::cli::output;
use crate::cli::{load_settings, resolve_vault};
use crate::errors::{Result, VaultError};
use crate::vault::selector::{scan, select_latest};
use crate::vault::VaultArtifact;

/// One row of `list` output.
#[derive(Debug, Serialize)]
pub struct RevisionRow {
    pub revision_id: String,
    pub timestamp: String,
    pub version: u8,
    pub size: u64,
    pub path: String,
}

impl From<&VaultArtifact> for RevisionRow {
    fn from(artifact: &VaultArtifact) -> Self {
        Self {
            revision_id: artifact.file.identity.revision_id.clone(),
            timestamp: artifact.file.identity.timestamp.clone(),
            version: artifact.version,
            size: artifact.size,
            path: artifact.path().display().to_string(),
        }
    }
}

/// Execute the `list` command.
pub fn execute(vault: Option<&str>, format: &str) -> Result<()> {
    let (cwd, settings) = load_settings()?;
    let vault_dir = resolve_vault(vault, &settings, &cwd);

    if !vault_dir.is_dir() {
        output::info(&format!("No vault directory at {}.", vault_dir.display()));
        output::tip("Run `bluejay lock --vault <DIR>` to create one.");
        return Ok(());
    }

    let rows: Vec<RevisionRow> = match select_latest(scan(&vault_dir)?, &vault_dir) {
        Ok(sorted) => sorted.iter().map(RevisionRow::from).collect(),
        Err(VaultError::NoCandidates(_)) => Vec::new(),
        Err(e) => return Err(e),
    };

    match format {
        "table" => print_table(&rows),
        "json" => println!("{}", format_as_json(&rows)?),
        other => {
            return Err(VaultError::CommandFailed(format!(
                "unknown list format '{other}' — use 'table' or 'json'"
            )));
        }
    }

    Ok(())
}

fn print_table(rows: &[RevisionRow]) {
    if rows.is_empty() {
        output::info("No revisions in this vault yet.");
        output::tip("Run `bluejay lock` to store the first one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Revision", "Timestamp", "Version", "Size", "Path"]);

    for row in rows {
        table.add_row(vec![
            short_id(&row.revision_id).to_string(),
            row.timestamp.clone(),
            row.version.to_string(),
            format_size(row.size),
            row.path.clone(),
        ]);
    }

    output::info(&format!("{} revision(s) found:", rows.len()));
    println!("{table}");
}

fn format_as_json(rows: &[RevisionRow]) -> Result<String> {
    serde_json::to_string_pretty(rows)
        .map_err(|e| VaultError::CommandFailed(format!("JSON serialization failed: {e}")))
}

/// First 12 characters of a revision id; ids are usually full commit hashes.
fn short_id(id: &str) -> &str {
    match id.char_indices().nth(12) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Format file size in human-readable form.
#[allow(clippy::cast_precision_loss)] // File sizes are well within f64 precision range
fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{RevisionFile, RevisionIdentity};

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn short_id_truncates_long_hashes() {
        assert_eq!(
            short_id("0123456789abcdef0123456789abcdef01234567"),
            "0123456789ab"
        );
        assert_eq!(short_id("HEAD"), "HEAD");
    }

    #[test]
    fn rows_serialize_as_json() {
        let identity = RevisionIdentity::new("abc", "20230101T000000").unwrap();
        let artifact = VaultArtifact {
            file: RevisionFile::artifact("/vault", identity),
            version: 1,
            size: 42,
        };
        let json = format_as_json(&[RevisionRow::from(&artifact)]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["revision_id"], "abc");
        assert_eq!(parsed[0]["timestamp"], "20230101T000000");
        assert_eq!(parsed[0]["size"], 42);
        assert_eq!(parsed[0]["path"], "/vault/abc_20230101T000000.rev");
    }
}
