use crate::archive::MAX_EXTRACTED_BYTES;
use crate::error::{InstallError, InstallResult};
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Component, Path};
use tar::{Archive, Entry};

/// Extract TAR.GZ archive
pub fn extract_tar_gz(tar_path: &Path, extract_to: &Path) -> InstallResult<usize> {
    let file = fs::File::open(tar_path).map_err(|e| InstallError::io(tar_path, e))?;

    let decoder = GzDecoder::new(file);
    extract_tar_from_reader(decoder, tar_path, extract_to)
}

/// Extract TAR.ZST archive (Zstandard compression)
pub fn extract_tar_zst(tar_path: &Path, extract_to: &Path) -> InstallResult<usize> {
    let file = fs::File::open(tar_path).map_err(|e| InstallError::io(tar_path, e))?;

    let decoder = zstd::Decoder::new(file).map_err(|e| {
        InstallError::extract(tar_path, format!("failed to create zstd decoder: {e}"))
    })?;
    extract_tar_from_reader(decoder, tar_path, extract_to)
}

/// Unpack a tar stream; `unpack_in` refuses entries that escape `extract_to`
fn extract_tar_from_reader<R: Read>(
    reader: R,
    tar_path: &Path,
    extract_to: &Path,
) -> InstallResult<usize> {
    let mut archive = Archive::new(reader);
    archive.set_preserve_permissions(true);

    fs::create_dir_all(extract_to).map_err(|e| InstallError::io(extract_to, e))?;

    let mut extracted_count = 0;
    let mut extracted_bytes: u64 = 0;

    let entries = archive
        .entries()
        .map_err(|e| InstallError::extract(tar_path, format!("failed to read entries: {e}")))?;

    for entry in entries {
        let mut entry = entry
            .map_err(|e| InstallError::extract(tar_path, format!("failed to access entry: {e}")))?;

        extracted_bytes = extracted_bytes.saturating_add(entry.header().size().unwrap_or(0));
        if extracted_bytes > MAX_EXTRACTED_BYTES {
            return Err(InstallError::extract(
                tar_path,
                format!("archive expands past the {MAX_EXTRACTED_BYTES} byte limit"),
            ));
        }

        let name = entry
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "<invalid path>".to_string());

        check_link_target(&entry, tar_path, &name)?;

        let unpacked = entry
            .unpack_in(extract_to)
            .map_err(|e| InstallError::extract(tar_path, format!("failed to extract {name}: {e}")))?;

        if !unpacked {
            return Err(InstallError::extract(
                tar_path,
                format!("refusing to extract entry outside the destination: {name}"),
            ));
        }

        extracted_count += 1;
    }

    Ok(extracted_count)
}

/// Symlinks and hardlinks must point at a relative path below the destination
fn check_link_target<R: Read>(entry: &Entry<'_, R>, tar_path: &Path, name: &str) -> InstallResult<()> {
    let entry_type = entry.header().entry_type();
    if !entry_type.is_symlink() && !entry_type.is_hard_link() {
        return Ok(());
    }

    let target = entry
        .link_name()
        .map_err(|e| InstallError::extract(tar_path, format!("bad link target for {name}: {e}")))?
        .ok_or_else(|| InstallError::extract(tar_path, format!("link {name} has no target")))?;

    let escapes = target
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(InstallError::extract(
            tar_path,
            format!(
                "refusing link that points outside the destination: {name} -> {}",
                target.display()
            ),
        ));
    }
    Ok(())
}
