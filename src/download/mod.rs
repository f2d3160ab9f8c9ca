//! Archive acquisition.
//!
//! [`ArchiveFetcher`] is the HTTP capability the pipeline depends on;
//! [`download_to`] writes whatever a fetcher returns to disk.

pub mod http;

use crate::error::{InstallError, InstallResult};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Source of remote archive bytes.
pub trait ArchiveFetcher {
    /// Open a byte stream for the body at `url`.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::Fetch` when the request fails or the server
    /// does not answer with a success status.
    fn fetch(&self, url: &str) -> InstallResult<Box<dyn Read>>;
}

/// Download `url` to `path`, overwriting any existing file.
///
/// The body is streamed into a `.tmp` sibling and renamed into place, so a
/// failed download never leaves a truncated archive under `path`.
pub fn download_to(fetcher: &dyn ArchiveFetcher, url: &str, path: &Path) -> InstallResult<u64> {
    let mut body = fetcher.fetch(url)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| InstallError::io(parent, e))?;
    }

    let temp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("download")
    ));

    let mut temp_file =
        fs::File::create(&temp_path).map_err(|e| InstallError::io(&temp_path, e))?;

    let written = std::io::copy(&mut body, &mut temp_file)
        .and_then(|written| temp_file.sync_all().map(|()| written))
        .map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            InstallError::fetch(url, format!("failed to write body: {e}"), None)
        })?;
    drop(temp_file);

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        InstallError::io(path, e)
    })?;

    log::debug!("Downloaded {url} -> {} ({written} bytes)", path.display());
    Ok(written)
}
