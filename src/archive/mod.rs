//! Archive extraction.
//!
//! Entries that would land outside the destination (`../`, absolute paths)
//! are rejected, and the declared uncompressed size of an archive is capped
//! at [`MAX_EXTRACTED_BYTES`].

pub mod tar;
pub mod zip;

use crate::error::{InstallError, InstallResult};
use std::path::Path;

/// Upper bound on the total uncompressed size of one archive (4 GiB).
pub const MAX_EXTRACTED_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Archive codec capability.
pub trait ArchiveExtractor {
    /// Whether archives with this extension (`zip`, `tar.gz`, ...) can be opened
    fn supports(&self, extension: &str) -> bool;

    /// Unpack every entry of `archive` below `destination`, returning the
    /// number of entries written.
    fn extract(&self, archive: &Path, destination: &Path) -> InstallResult<usize>;
}

/// Formats understood by [`ArchiveCodec`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    TarZst,
}

impl ArchiveFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "zip" => Some(Self::Zip),
            "tar.gz" | "tgz" => Some(Self::TarGz),
            "tar.zst" | "tzst" => Some(Self::TarZst),
            _ => None,
        }
    }

    /// Detect the format from a file name such as `laravel1a2b.tar.gz`
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        ["tar.gz", "tar.zst", "tgz", "tzst", "zip"]
            .iter()
            .find(|ext| name.ends_with(&format!(".{ext}")))
            .and_then(|ext| Self::from_extension(ext))
    }
}

/// Extractor backed by the zip, tar, flate2 and zstd crates
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveCodec;

impl ArchiveExtractor for ArchiveCodec {
    fn supports(&self, extension: &str) -> bool {
        ArchiveFormat::from_extension(extension).is_some()
    }

    fn extract(&self, archive: &Path, destination: &Path) -> InstallResult<usize> {
        let format = ArchiveFormat::from_path(archive).ok_or_else(|| {
            InstallError::extract(archive, "unknown archive format")
        })?;

        let count = match format {
            ArchiveFormat::Zip => zip::extract_zip(archive, destination)?,
            ArchiveFormat::TarGz => tar::extract_tar_gz(archive, destination)?,
            ArchiveFormat::TarZst => tar::extract_tar_zst(archive, destination)?,
        };

        log::debug!(
            "Extracted {count} entries from {} to {}",
            archive.display(),
            destination.display()
        );
        Ok(count)
    }
}
