//! Tagger module: writes recovered metadata into the lossy output's ID3 tag.
//!
//! Tagging is idempotent. An existing tag is read and only the fields present
//! in the [`MetadataRecord`] are replaced; a missing or unreadable tag is
//! treated as an empty one.

mod error;

pub use error::TagError;

use id3::{ErrorKind, Tag, TagLike, Version};
use std::path::Path;
use tracing::{debug, warn};

use crate::conversion::MetadataRecord;

/// Frame id for the track number.
const TRACK_FRAME: &str = "TRCK";

/// Writes metadata into an output file.
pub trait Tagger: Send + Sync {
    /// Returns the name of this tagger implementation.
    fn name(&self) -> &str;

    /// Merges the present fields of `metadata` into the tag of `path`.
    fn tag(&self, path: &Path, metadata: &MetadataRecord) -> Result<(), TagError>;
}

/// ID3v2.4 tagger for MP3 outputs.
#[derive(Debug, Clone, Default)]
pub struct Id3Tagger;

impl Id3Tagger {
    pub fn new() -> Self {
        Self
    }

    fn load(path: &Path) -> Tag {
        match Tag::read_from_path(path) {
            Ok(tag) => tag,
            Err(e) if matches!(e.kind, ErrorKind::NoTag) => Tag::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable ID3 tag, starting from an empty one");
                Tag::new()
            }
        }
    }
}

impl Tagger for Id3Tagger {
    fn name(&self) -> &str {
        "id3"
    }

    fn tag(&self, path: &Path, metadata: &MetadataRecord) -> Result<(), TagError> {
        if !path.is_file() {
            return Err(TagError::TargetNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut tag = Self::load(path);
        if let Some(title) = &metadata.title {
            tag.set_title(title.as_str());
        }
        if let Some(artist) = &metadata.artist {
            tag.set_artist(artist.as_str());
        }
        if let Some(album) = &metadata.album {
            tag.set_album(album.as_str());
        }
        if let Some(track) = &metadata.track {
            tag.set_text(TRACK_FRAME, track.as_str());
        }

        tag.write_to_path(path, Version::Id3v24)
            .map_err(|e| TagError::Write {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        debug!(path = %path.display(), "Tags written");
        Ok(())
    }
}
