//! Error types for filesystem operations.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single file operation, after all applicable fallbacks.
#[derive(Error, Debug)]
pub enum FileOpError {
    /// I/O error on a specific path
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No host-side execution is available (not running in a sandbox)
    #[error("Host fallback is not available outside a sandbox")]
    NoHostFallback,

    /// Host-side command ran but reported failure
    #[error("Host command `{command}` failed: {detail}")]
    HostCommand { command: String, detail: String },

    /// Host-side command did not finish in time
    #[error("Host command `{command}` timed out after {secs}s")]
    HostTimeout { command: String, secs: u64 },

    /// A directory sits where a file is expected
    #[error("Refusing to replace directory: {0}")]
    Directory(PathBuf),
}

impl FileOpError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for file operations
pub type Result<T> = std::result::Result<T, FileOpError>;
