//! Mock tagger for testing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::conversion::MetadataRecord;
use crate::tagger::{TagError, Tagger};

/// Mock implementation of the Tagger trait.
///
/// Records every tagged path and the record it was given. Tagging is
/// synchronous, so state sits behind std mutexes.
#[derive(Debug, Clone, Default)]
pub struct MockTagger {
    tagged: Arc<Mutex<Vec<(PathBuf, MetadataRecord)>>>,
    failing: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockTagger {
    /// Create a new mock tagger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths tagged successfully, in call order.
    pub fn tagged_paths(&self) -> Vec<PathBuf> {
        self.lock_tagged().iter().map(|(path, _)| path.clone()).collect()
    }

    /// Records handed to successful tag calls, in call order.
    pub fn tagged_records(&self) -> Vec<MetadataRecord> {
        self.lock_tagged().iter().map(|(_, record)| record.clone()).collect()
    }

    /// Fail tagging of `path`.
    pub fn fail_for(&self, path: impl AsRef<Path>) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.as_ref().to_path_buf());
    }

    fn lock_tagged(&self) -> std::sync::MutexGuard<'_, Vec<(PathBuf, MetadataRecord)>> {
        self.tagged.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Tagger for MockTagger {
    fn name(&self) -> &str {
        "mock"
    }

    fn tag(&self, path: &Path, metadata: &MetadataRecord) -> Result<(), TagError> {
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(path);
        if failing {
            return Err(TagError::Write {
                path: path.to_path_buf(),
                reason: "injected tag failure".to_string(),
            });
        }

        self.lock_tagged().push((path.to_path_buf(), metadata.clone()));
        Ok(())
    }
}
