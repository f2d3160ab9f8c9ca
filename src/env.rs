use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Process-level lookups the installer depends on.
///
/// Everything that would otherwise read global state (working directory,
/// PATH, terminal) goes through this trait so plans can run against a fake.
pub trait Environment {
    /// Working directory the installer was started from
    fn current_dir(&self) -> &Path;

    /// Whether a file or directory exists at `path`
    fn exists(&self, path: &Path) -> bool;

    /// Locate an executable on the search path
    fn find_executable(&self, name: &str) -> Option<PathBuf>;

    /// Whether child processes may be attached to an interactive terminal
    fn has_tty(&self) -> bool;
}

/// The real process environment
#[derive(Debug, Clone)]
pub struct SystemEnvironment {
    cwd: PathBuf,
}

impl SystemEnvironment {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            cwd: std::env::current_dir()?,
        })
    }
}

impl Environment for SystemEnvironment {
    fn current_dir(&self) -> &Path {
        &self.cwd
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    fn has_tty(&self) -> bool {
        // Backslash-separator platforms never get tty passthrough
        if cfg!(windows) {
            return false;
        }
        std::io::stdout().is_terminal() && fs::File::open("/dev/tty").is_ok()
    }
}
