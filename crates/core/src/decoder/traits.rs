//! Trait definitions for the decoder module.

use async_trait::async_trait;
use std::path::Path;

use super::error::DecodeError;
use crate::conversion::MetadataRecord;

/// Decrypts an encrypted container into a playable audio file.
#[async_trait]
pub trait Decoder: Send + Sync {
    /// Returns the name of this decoder implementation.
    fn name(&self) -> &str;

    /// Writes the decoded audio stream of `source` to `target`, overwriting it,
    /// and returns whatever metadata the container carried.
    async fn decode(&self, source: &Path, target: &Path) -> Result<MetadataRecord, DecodeError>;
}
