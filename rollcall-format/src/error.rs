//! Error types for rollcall-format.

use thiserror::Error;

/// All errors that can arise from formatting.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Tera template engine error (title template parse or render).
    #[error("title template error: {0}")]
    Template(#[from] tera::Error),
}
