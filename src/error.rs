use std::io;
use std::path::PathBuf;

/// Result type alias for installer operations.
pub type InstallResult<T> = std::result::Result<T, InstallError>;

/// Errors raised by the install pipeline.
///
/// Preconditions, fetch and extract failures abort the active plan.
/// Permission repair and archive cleanup never surface here; they are
/// reported as warnings or ignored.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// The target directory is already occupied and `--force` was not given.
    #[error("Application already exists!")]
    AlreadyExists {
        /// The occupied target.
        target: PathBuf,
    },

    /// No codec is available for the archive format a plan needs.
    #[error("The Zip extension is not installed. Please install it and try again.")]
    MissingCodec {
        /// Archive extension that could not be handled.
        extension: String,
    },

    /// Downloading the archive failed.
    #[error("download failed for {url}: {message}")]
    Fetch {
        /// URL being fetched.
        url: String,
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The archive could not be unpacked.
    #[error("failed to extract {archive}: {message}")]
    Extract {
        /// Archive being extracted.
        archive: PathBuf,
        /// Error message.
        message: String,
    },

    /// IO error during file operations.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A child process could not be started.
    #[error("failed to execute: {command}: {source}")]
    Command {
        /// The command line that was attempted.
        command: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A request was constructed with inconsistent values.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl InstallError {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an extraction error.
    pub fn extract(archive: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Extract {
            archive: archive.into(),
            message: message.into(),
        }
    }

    /// Create a fetch error.
    pub fn fetch(url: impl Into<String>, message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
            status,
        }
    }

    /// Whether the error was raised before any filesystem mutation.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. } | Self::MissingCodec { .. })
    }
}

impl From<ureq::Error> for InstallError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => Self::Fetch {
                url: response.get_url().to_string(),
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            ureq::Error::Transport(transport) => Self::Fetch {
                url: transport
                    .url()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                message: transport.to_string(),
                status: None,
            },
        }
    }
}
