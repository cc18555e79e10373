//! Error taxonomy for resolving, installing and running the native tool.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for launcher operations.
pub type Result<T> = std::result::Result<T, LauncherError>;

/// Errors surfaced by the launcher.
///
/// A non-zero exit status of the forwarded tool is not an error; it is passed
/// through as the launcher's own exit code.
#[derive(Error, Debug)]
pub enum LauncherError {
    /// The host OS/architecture pair has no published release asset.
    #[error("unsupported platform: {os} {arch}")]
    UnsupportedPlatform {
        /// Operating system name as reported by the host.
        os: String,
        /// CPU architecture name as reported by the host.
        arch: String,
    },

    /// Fetching the release archive failed.
    #[error("failed to download {url}: {message}")]
    Download {
        /// The release asset URL.
        url: String,
        /// What went wrong.
        message: String,
    },

    /// The downloaded archive could not be unpacked.
    #[error("failed to extract '{binary}' from {}: {message}", .archive.display())]
    Extraction {
        /// The archive on local disk.
        archive: PathBuf,
        /// The executable that was looked for.
        binary: String,
        /// What went wrong.
        message: String,
    },

    /// The installed executable could not be started or waited on.
    #[error("failed to execute {}", .path.display())]
    Execution {
        /// The executable path.
        path: PathBuf,
        /// Underlying spawn/wait error.
        #[source]
        source: io::Error,
    },

    /// The bundled launcher descriptor is invalid.
    #[error("invalid launcher descriptor: {0}")]
    Config(String),

    /// A local filesystem operation on the installation failed.
    #[error("failed to {action} {}", .path.display())]
    Io {
        /// The operation, e.g. "create directory".
        action: &'static str,
        /// The path operated on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// No per-user cache directory is available on this host.
    #[error("could not determine a cache directory for the installation")]
    NoCacheDir,
}

impl LauncherError {
    /// Create an unsupported platform error.
    #[must_use]
    pub fn unsupported_platform(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Create a download error.
    #[must_use]
    pub fn download(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an extraction error.
    #[must_use]
    pub fn extraction(
        archive: impl Into<PathBuf>,
        binary: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Extraction {
            archive: archive.into(),
            binary: binary.into(),
            message: message.into(),
        }
    }

    /// Returns a closure mapping an `io::Error` on `path` into [`LauncherError::Io`].
    ///
    /// Intended for `map_err`:
    /// `fs::create_dir_all(dir).map_err(LauncherError::io("create directory", dir))?`
    pub fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> Self + 'a {
        move |source| Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns a closure mapping a spawn/wait error into [`LauncherError::Execution`].
    pub fn execution(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Execution {
            path: path.to_path_buf(),
            source,
        }
    }
}
