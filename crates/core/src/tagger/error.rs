//! Error types for the tagger module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing tags. Never propagated past the Conversion Unit.
#[derive(Debug, Error)]
pub enum TagError {
    /// Output file is missing.
    #[error("Tag target not found: {path}")]
    TargetNotFound { path: PathBuf },

    /// The tag container could not be written.
    #[error("Failed to write tags to {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    /// Tag writer task did not finish.
    #[error("Tag task aborted: {0}")]
    Aborted(String),
}
