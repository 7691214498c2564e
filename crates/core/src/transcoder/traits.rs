//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::Path;

use super::error::TranscodeError;

/// Produces a lossy copy of a lossless file.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Encodes `input` into `output` at the configured quality, overwriting `output`.
    ///
    /// The input is left in place.
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscodeError>;
}
