//! Error types for the decoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while decrypting a container.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Source vanished or was never there.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// File does not start with the container magic.
    #[error("Not an NCM container (bad magic)")]
    InvalidMagic,

    /// File ended before a header section was complete.
    #[error("Container truncated while reading {section}")]
    Truncated { section: &'static str },

    /// Key or metadata block could not be decrypted.
    #[error("Failed to decrypt {section}: {reason}")]
    Crypto {
        section: &'static str,
        reason: String,
    },

    /// Decrypted metadata was not valid JSON.
    #[error("Malformed metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// Read or write failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Opaque failure reported by a decoder implementation.
    #[error("{0}")]
    Other(String),
}

impl DecodeError {
    /// Creates a decryption error for a header section.
    pub fn crypto(section: &'static str, reason: impl Into<String>) -> Self {
        Self::Crypto {
            section,
            reason: reason.into(),
        }
    }
}
