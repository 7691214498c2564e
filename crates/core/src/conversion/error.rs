//! Error types for the conversion module.

use std::path::PathBuf;
use thiserror::Error;

use super::types::FailureKind;
use crate::decoder::DecodeError;
use crate::transcoder::TranscodeError;

/// Errors raised when a path is offered to a batch.
#[derive(Debug, Error)]
pub enum JobError {
    /// Source file does not exist.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Source file does not carry the `.ncm` extension.
    #[error("Not an NCM file: {path}")]
    UnsupportedExtension { path: PathBuf },
}

/// Errors that end a single job.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Decryption failed.
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// Transcoding failed.
    #[error("Transcode failed: {0}")]
    Transcode(#[from] TranscodeError),

    /// Preparing the output location failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConversionError {
    /// Creates an I/O error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Human-readable message, including transcoder output when there is some.
    pub fn message(&self) -> String {
        match self {
            Self::Transcode(e) => match e.stderr() {
                Some(stderr) => format!("{self}: {stderr}"),
                None => self.to_string(),
            },
            _ => self.to_string(),
        }
    }

    /// Failure category reported to the caller.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Decode(_) => FailureKind::Decode,
            Self::Transcode(_) => FailureKind::Transcode,
            Self::Io { .. } => FailureKind::Io,
        }
    }
}
