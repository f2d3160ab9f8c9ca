use crate::archive::MAX_EXTRACTED_BYTES;
use crate::error::{InstallError, InstallResult};
use std::fs;
use std::path::Path;
use zip::ZipArchive;

/// Extract a ZIP archive into `extract_to`, preserving relative paths
pub fn extract_zip(zip_path: &Path, extract_to: &Path) -> InstallResult<usize> {
    let file = fs::File::open(zip_path).map_err(|e| InstallError::io(zip_path, e))?;

    let mut archive = ZipArchive::new(file)
        .map_err(|e| InstallError::extract(zip_path, format!("failed to read zip archive: {e}")))?;

    let declared = declared_total(
        (0..archive.len()).filter_map(|i| archive.by_index_raw(i).ok().map(|entry| entry.size())),
    );
    if declared > MAX_EXTRACTED_BYTES {
        return Err(InstallError::extract(
            zip_path,
            format!("archive expands to {declared} bytes, over the {MAX_EXTRACTED_BYTES} byte limit"),
        ));
    }

    fs::create_dir_all(extract_to).map_err(|e| InstallError::io(extract_to, e))?;

    let mut extracted_count = 0;
    // Applied last so a read-only directory does not block its own children
    #[cfg(unix)]
    let mut dir_modes = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| InstallError::extract(zip_path, format!("failed to access entry {i}: {e}")))?;

        let relative = entry.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
            InstallError::extract(
                zip_path,
                format!("refusing to extract entry outside the destination: {}", entry.name()),
            )
        })?;
        let outpath = extract_to.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| InstallError::io(&outpath, e))?;
        } else {
            if let Some(parent) = outpath.parent()
                && !parent.exists()
            {
                fs::create_dir_all(parent).map_err(|e| InstallError::io(parent, e))?;
            }

            let mut outfile =
                fs::File::create(&outpath).map_err(|e| InstallError::io(&outpath, e))?;
            std::io::copy(&mut entry, &mut outfile).map_err(|e| InstallError::io(&outpath, e))?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                if entry.is_dir() {
                    dir_modes.push((outpath, mode));
                } else {
                    fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))
                        .map_err(|e| InstallError::io(&outpath, e))?;
                }
            }
        }

        extracted_count += 1;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Deepest first, so parents are still writable while children change
        dir_modes.sort_by(|(a, _), (b, _)| b.cmp(a));
        for (path, mode) in dir_modes {
            fs::set_permissions(&path, fs::Permissions::from_mode(mode))
                .map_err(|e| InstallError::io(&path, e))?;
        }
    }

    Ok(extracted_count)
}

/// Sum of entry sizes as claimed by the central directory, saturating
fn declared_total(sizes: impl IntoIterator<Item = u64>) -> u64 {
    sizes.into_iter().fold(0u64, u64::saturating_add)
}
