//! Types for the conversion module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::JobError;

/// Extension accepted for encrypted source containers.
pub const SOURCE_EXTENSION: &str = "ncm";

/// Extension of the lossless output.
pub const LOSSLESS_EXTENSION: &str = "flac";

/// Extension of the lossy output.
pub const LOSSY_EXTENSION: &str = "mp3";

/// Output encodings requested for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Keep only the decoded lossless file.
    Lossless,
    /// Keep only the lossy transcode; the lossless intermediate is removed.
    #[default]
    Lossy,
    /// Keep both files.
    Both,
}

impl OutputFormat {
    /// Whether this mode needs the transcoder.
    pub fn needs_transcode(&self) -> bool {
        matches!(self, Self::Lossy | Self::Both)
    }

    /// Whether the lossless file survives the job.
    pub fn keeps_lossless(&self) -> bool {
        matches!(self, Self::Lossless | Self::Both)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lossless" | "flac" => Ok(Self::Lossless),
            "lossy" | "mp3" => Ok(Self::Lossy),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Lossless => "lossless",
            Self::Lossy => "lossy",
            Self::Both => "both",
        };
        f.write_str(name)
    }
}

/// One source file accepted into a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Encrypted container to convert.
    pub source_path: PathBuf,
    /// Outputs to keep.
    pub requested_format: OutputFormat,
}

impl ConversionJob {
    /// Creates a job without touching the filesystem.
    pub fn new(source_path: impl Into<PathBuf>, requested_format: OutputFormat) -> Self {
        Self {
            source_path: source_path.into(),
            requested_format,
        }
    }

    /// Creates a job after checking the source exists and has the source extension.
    pub fn validated(
        source_path: impl Into<PathBuf>,
        requested_format: OutputFormat,
    ) -> Result<Self, JobError> {
        let source_path = source_path.into();
        if !has_source_extension(&source_path) {
            return Err(JobError::UnsupportedExtension { path: source_path });
        }
        if !source_path.is_file() {
            return Err(JobError::SourceNotFound { path: source_path });
        }
        Ok(Self::new(source_path, requested_format))
    }
}

/// Whether `path` ends in `.ncm`, ignoring case.
pub fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(SOURCE_EXTENSION))
        .unwrap_or(false)
}

/// Metadata recovered from a container. Absent fields are never written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
}

impl MetadataRecord {
    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.artist.is_none() && self.album.is_none() && self.track.is_none()
    }
}

/// Category of a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Source unreadable, corrupt or not an encrypted container.
    Decode,
    /// External transcoder failed or is missing.
    Transcode,
    /// Directory or file creation/deletion failed.
    Io,
    /// Another worker already holds this source path.
    InFlight,
    /// The batch was cancelled before this job started.
    Cancelled,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Decode => "decode",
            Self::Transcode => "transcode",
            Self::Io => "io",
            Self::InFlight => "in_flight",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Outcome of one job, produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionResult {
    Success {
        source_path: PathBuf,
        /// Lossless first, then lossy, for the files that were kept.
        output_paths: Vec<PathBuf>,
        /// Non-fatal problems, such as a tag write that was skipped.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },
    Failure {
        source_path: PathBuf,
        error_kind: FailureKind,
        message: String,
    },
}

impl ConversionResult {
    /// Creates a failure result.
    pub fn failure(
        source_path: impl Into<PathBuf>,
        error_kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Failure {
            source_path: source_path.into(),
            error_kind,
            message: message.into(),
        }
    }

    /// Source path of the job this result belongs to.
    pub fn source_path(&self) -> &Path {
        match self {
            Self::Success { source_path, .. } | Self::Failure { source_path, .. } => source_path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
