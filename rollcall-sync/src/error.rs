//! Error types for rollcall-sync.

use std::path::PathBuf;

use thiserror::Error;

use rollcall_core::{ConfigError, ServiceError};
use rollcall_format::FormatError;

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A directory or spreadsheet call failed.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// The property store could not be read or written.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Title template error.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Another run holds the destination.
    #[error("destination {destination} is locked by another run ({path})")]
    Locked { destination: String, path: PathBuf },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (lock file).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
