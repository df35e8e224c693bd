//! Packing a directory into a single file and back.
//!
//! The vault only needs a byte stream per directory; `Archiver` hides
//! how that stream is produced.  `TarGzArchiver` writes a gzip-compressed
//! tar whose entries are relative to the source directory itself, so
//! extraction recreates the directory's contents directly inside the
//! destination.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::errors::{Result, VaultError};

/// Turns a directory into a file and a file back into a directory.
pub trait Archiver {
    /// Pack `source_dir` into `dest_file`, creating or truncating it.
    fn archive(&self, source_dir: &Path, dest_file: &Path) -> Result<()>;

    /// Unpack `src_file` into `dest_dir`, creating the directory.
    fn extract(&self, src_file: &Path, dest_dir: &Path) -> Result<()>;
}

/// `.tar.gz` archiver.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzArchiver {
    compression: Compression,
}

impl TarGzArchiver {
    pub fn new(level: u32) -> Self {
        Self {
            compression: Compression::new(level),
        }
    }
}

impl Archiver for TarGzArchiver {
    fn archive(&self, source_dir: &Path, dest_file: &Path) -> Result<()> {
        tracing::debug!(
            "archiving {} into {}",
            source_dir.display(),
            dest_file.display()
        );
        let fail = |e: std::io::Error| {
            VaultError::Archive(format!(
                "packing {} into {}: {e}",
                source_dir.display(),
                dest_file.display()
            ))
        };

        let file = File::create(dest_file).map_err(fail)?;
        let encoder = GzEncoder::new(BufWriter::new(file), self.compression);

        let mut builder = tar::Builder::new(encoder);
        // Keep symlinks as links; a repository may contain links that
        // point outside of it.
        builder.follow_symlinks(false);
        builder.append_dir_all(".", source_dir).map_err(fail)?;

        let encoder = builder.into_inner().map_err(fail)?;
        let mut writer = encoder.finish().map_err(fail)?;
        writer.flush().map_err(fail)?;
        Ok(())
    }

    fn extract(&self, src_file: &Path, dest_dir: &Path) -> Result<()> {
        tracing::debug!(
            "extracting {} into {}",
            src_file.display(),
            dest_dir.display()
        );
        let fail = |e: std::io::Error| {
            VaultError::Archive(format!(
                "unpacking {} into {}: {e}",
                src_file.display(),
                dest_dir.display()
            ))
        };

        let file = File::open(src_file).map_err(fail)?;
        let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
        archive.set_preserve_permissions(true);
        archive.unpack(dest_dir).map_err(fail)?;
        Ok(())
    }
}
