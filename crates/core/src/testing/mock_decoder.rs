//! Mock decoder for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::conversion::{output_key, MetadataRecord};
use crate::decoder::{DecodeError, Decoder};

/// How an injected failure behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailMode {
    Immediate,
    AfterPartialWrite,
}

/// Mock implementation of the Decoder trait.
///
/// Writes a small fake lossless file and returns a configurable record.
/// Failures can be injected per source path, optionally after writing a
/// partial output, and the number of concurrent decodes per source file
/// (aliases included) is tracked for exclusivity assertions.
#[derive(Debug, Clone)]
pub struct MockDecoder {
    decoded: Arc<RwLock<Vec<PathBuf>>>,
    metadata: Arc<RwLock<MetadataRecord>>,
    failures: Arc<RwLock<HashMap<PathBuf, FailMode>>>,
    delay_ms: Arc<RwLock<u64>>,
    active: Arc<Mutex<HashMap<PathBuf, usize>>>,
    max_overlap: Arc<AtomicUsize>,
}

impl Default for MockDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDecoder {
    /// Create a new mock decoder.
    pub fn new() -> Self {
        Self {
            decoded: Arc::new(RwLock::new(Vec::new())),
            metadata: Arc::new(RwLock::new(Self::default_metadata())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            delay_ms: Arc::new(RwLock::new(0)),
            active: Arc::new(Mutex::new(HashMap::new())),
            max_overlap: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Record returned unless [`set_metadata`](Self::set_metadata) is called.
    pub fn default_metadata() -> MetadataRecord {
        MetadataRecord {
            title: Some("Mock Title".to_string()),
            artist: Some("Mock Artist".to_string()),
            album: Some("Mock Album".to_string()),
            track: Some("1".to_string()),
        }
    }

    /// Set the record returned by every decode.
    pub async fn set_metadata(&self, metadata: MetadataRecord) {
        *self.metadata.write().await = metadata;
    }

    /// Fail decodes of `source` without writing anything.
    pub async fn fail_for(&self, source: impl AsRef<Path>) {
        self.failures
            .write()
            .await
            .insert(source.as_ref().to_path_buf(), FailMode::Immediate);
    }

    /// Fail decodes of `source` after writing a partial target.
    pub async fn fail_after_partial_write(&self, source: impl AsRef<Path>) {
        self.failures
            .write()
            .await
            .insert(source.as_ref().to_path_buf(), FailMode::AfterPartialWrite);
    }

    /// Set the simulated decode duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay_ms.write().await = delay.as_millis() as u64;
    }

    /// Number of decodes attempted.
    pub async fn decode_count(&self) -> usize {
        self.decoded.read().await.len()
    }

    /// Highest number of simultaneous decodes seen for any single source file.
    pub fn max_concurrent_per_source(&self) -> usize {
        self.max_overlap.load(Ordering::SeqCst)
    }

    fn enter(&self, key: &Path) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        let count = active.entry(key.to_path_buf()).or_insert(0);
        *count += 1;
        self.max_overlap.fetch_max(*count, Ordering::SeqCst);
    }

    fn exit(&self, key: &Path) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = active.get_mut(key) {
            *count -= 1;
        }
    }

    async fn simulate(&self, source: &Path, target: &Path) -> Result<MetadataRecord, DecodeError> {
        let delay_ms = *self.delay_ms.read().await;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        let failure = self.failures.read().await.get(source).copied();
        match failure {
            Some(FailMode::Immediate) => Err(DecodeError::Other("injected decode failure".to_string())),
            Some(FailMode::AfterPartialWrite) => {
                tokio::fs::write(target, b"fLaC partial").await?;
                Err(DecodeError::Other("injected decode failure".to_string()))
            }
            None => {
                let mut content = b"fLaC mock lossless ".to_vec();
                content.extend_from_slice(source.to_string_lossy().as_bytes());
                tokio::fs::write(target, content).await?;
                Ok(self.metadata.read().await.clone())
            }
        }
    }
}

#[async_trait]
impl Decoder for MockDecoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn decode(&self, source: &Path, target: &Path) -> Result<MetadataRecord, DecodeError> {
        self.decoded.write().await.push(source.to_path_buf());
        let key = output_key(source);
        self.enter(&key);
        let result = self.simulate(source, target).await;
        self.exit(&key);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_basic_decode() {
        let dir = TempDir::new().unwrap();
        let decoder = MockDecoder::new();
        let target = dir.path().join("a.flac");

        let metadata = decoder.decode(Path::new("/a.ncm"), &target).await.unwrap();
        assert_eq!(metadata, MockDecoder::default_metadata());
        assert!(target.exists());
        assert_eq!(decoder.decode_count().await, 1);
        assert_eq!(decoder.max_concurrent_per_source(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let dir = TempDir::new().unwrap();
        let decoder = MockDecoder::new();
        decoder.fail_for("/bad.ncm").await;

        let target = dir.path().join("bad.flac");
        let result = decoder.decode(Path::new("/bad.ncm"), &target).await;
        assert!(result.is_err());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_failed_write_releases_concurrency_slot() {
        let dir = TempDir::new().unwrap();
        let decoder = MockDecoder::new();
        let source = Path::new("/song.ncm");

        let unwritable = dir.path().join("missing-dir").join("song.flac");
        assert!(decoder.decode(source, &unwritable).await.is_err());

        decoder
            .decode(source, &dir.path().join("song.flac"))
            .await
            .unwrap();
        assert_eq!(decoder.max_concurrent_per_source(), 1);
    }
}
