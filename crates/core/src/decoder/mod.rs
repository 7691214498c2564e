//! Decoder module: decrypts encrypted containers into lossless audio.
//!
//! The [`Decoder`] trait is the collaborator boundary. [`decode_to`] wraps any
//! implementation with the adapter guarantees the Conversion Unit relies on:
//! the source is re-checked before decoding and a failed decode never leaves a
//! partially written target behind.

mod error;
pub(crate) mod ncm;
mod traits;

pub use error::DecodeError;
pub use ncm::NcmDecoder;
pub use traits::Decoder;

use std::path::Path;
use tracing::debug;

use crate::conversion::{discard, MetadataRecord};

/// Decodes `source` into `target` through `decoder`.
pub async fn decode_to(
    decoder: &dyn Decoder,
    source: &Path,
    target: &Path,
) -> Result<MetadataRecord, DecodeError> {
    if !tokio::fs::try_exists(source).await? {
        return Err(DecodeError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }

    debug!(decoder = decoder.name(), source = %source.display(), "Decoding");
    match decoder.decode(source, target).await {
        Ok(metadata) => Ok(metadata),
        Err(e) => {
            discard(target).await;
            Err(e)
        }
    }
}
