use crate::ui::Reporter;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Mode applied to writable directories and everything below them
pub const WRITABLE_MODE: u32 = 0o755;

/// Recursively chmod each directory to [`WRITABLE_MODE`].
///
/// Failures never abort: each failing directory produces a warning through
/// `reporter` and the next directory is attempted. Returns the directories
/// that could not be repaired.
pub fn repair_permissions(dirs: &[PathBuf], reporter: &dyn Reporter) -> Vec<PathBuf> {
    let mut failed = Vec::new();

    for dir in dirs {
        if let Err(e) = chmod_recursive(dir) {
            log::warn!("chmod {:o} {} failed: {e}", WRITABLE_MODE, dir.display());
            reporter.comment(&format!(
                "You should verify that the \"{}\" directory is writable.",
                dir.display()
            ));
            failed.push(dir.clone());
        }
    }

    failed
}

fn chmod_recursive(dir: &Path) -> io::Result<()> {
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.path_is_symlink() {
            continue;
        }
        set_writable(entry.path())?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_writable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(WRITABLE_MODE))
}

#[cfg(not(unix))]
#[allow(clippy::permissions_set_readonly_false)]
fn set_writable(path: &Path) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(false);
    fs::set_permissions(path, permissions)
}
