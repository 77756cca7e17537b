use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the scheduler and launchd management.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schedule interval must be greater than zero")]
    InvalidInterval,

    #[error("{task} task join failure: {message}")]
    Join { task: &'static str, message: String },

    #[error("signal handler failed: {0}")]
    Signal(String),

    #[error("launchd error: {0}")]
    Launchd(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
