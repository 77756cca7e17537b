//! Error types for rollcall-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from the property store.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, annotated with the offending path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse properties at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.rollcall/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Failures reported by the external collaborators (directory service,
/// spreadsheet sink).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested resource does not exist.
    #[error("{service}: resource not found: {resource}")]
    NotFound {
        service: &'static str,
        resource: String,
    },

    /// The service rejected the call for quota or rate reasons.
    #[error("{service}: quota exceeded: {message}")]
    QuotaExceeded {
        service: &'static str,
        message: String,
    },

    /// The stored incremental-changes cursor is no longer accepted.
    #[error("{service}: sync token expired")]
    ExpiredSyncToken { service: &'static str },

    /// No destination was configured and the sink has no active one.
    #[error("no destination configured and no active destination available")]
    NoActiveDestination,

    /// Non-success HTTP status not covered by a more specific variant.
    #[error("{service}: HTTP {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Network-level failure (connect, timeout, TLS).
    #[error("{service}: transport error: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    /// Response body could not be decoded.
    #[error("{service}: malformed response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    /// Filesystem failure in a file-backed collaborator.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`ConfigError::Io`].
pub fn config_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`ServiceError::Io`].
pub fn service_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ServiceError {
    ServiceError::Io {
        path: path.into(),
        source,
    }
}
