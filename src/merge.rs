use crate::error::{InstallError, InstallResult};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path};

/// Move everything under `source` into `destination`, dropping files whose
/// base name is in `excluded`.
///
/// This is a destructive merge: each file is removed from `source` once it
/// has been copied (or skipped), and each source directory is removed once
/// empty. Symlinks are never followed: a relative link without `..` is
/// re-created as a link, anything else is dropped with a warning. Existing
/// destination files are overwritten, and entries already consumed by an
/// earlier interrupted run are tolerated, so the merge can simply be re-run.
pub fn merge_tree(source: &Path, destination: &Path, excluded: &HashSet<String>) -> InstallResult<()> {
    if !source.exists() {
        log::debug!("Nothing left to merge from {}", source.display());
        return Ok(());
    }

    fs::create_dir_all(destination).map_err(|e| InstallError::io(destination, e))?;

    let entries = fs::read_dir(source).map_err(|e| InstallError::io(source, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| InstallError::io(source, e))?;
        let from = entry.path();
        let to = destination.join(entry.file_name());

        let file_type = entry.file_type().map_err(|e| InstallError::io(&from, e))?;
        if file_type.is_dir() {
            merge_tree(&from, &to, excluded)?;
            continue;
        }

        if is_excluded(&entry.file_name(), excluded) {
            log::debug!("Skipping {}", from.display());
        } else if file_type.is_symlink() {
            merge_symlink(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| InstallError::io(&to, e))?;
        }

        ignore_missing(&from, fs::remove_file(&from))?;
    }

    ignore_missing(source, fs::remove_dir(source))
}

fn merge_symlink(from: &Path, to: &Path) -> InstallResult<()> {
    let target = fs::read_link(from).map_err(|e| InstallError::io(from, e))?;

    let contained = target
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !contained {
        log::warn!(
            "Skipping {}: link points outside the project ({})",
            from.display(),
            target.display()
        );
        return Ok(());
    }

    if let Ok(existing) = fs::symlink_metadata(to)
        && !existing.is_dir()
    {
        fs::remove_file(to).map_err(|e| InstallError::io(to, e))?;
    }
    create_symlink(&target, to)
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> InstallResult<()> {
    std::os::unix::fs::symlink(target, link).map_err(|e| InstallError::io(link, e))
}

#[cfg(not(unix))]
fn create_symlink(target: &Path, link: &Path) -> InstallResult<()> {
    log::warn!(
        "Skipping {}: symlinks are not recreated on this platform ({})",
        link.display(),
        target.display()
    );
    Ok(())
}

fn is_excluded(name: &OsStr, excluded: &HashSet<String>) -> bool {
    name.to_str().is_some_and(|name| excluded.contains(name))
}

/// Removal of an already-consumed entry is not an error
fn ignore_missing(path: &Path, result: io::Result<()>) -> InstallResult<()> {
    match result {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(InstallError::io(path, e)),
        _ => Ok(()),
    }
}
