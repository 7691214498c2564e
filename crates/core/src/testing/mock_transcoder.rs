//! Mock transcoder for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::transcoder::{TranscodeError, Transcoder};

/// A recorded transcode for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTranscode {
    pub input: PathBuf,
    pub output: PathBuf,
    pub success: bool,
}

/// Mock implementation of the Transcoder trait.
///
/// Writes the input bytes behind an MPEG frame sync so the output is
/// taggable. Failures can be injected for every call or per input path.
#[derive(Debug, Clone, Default)]
pub struct MockTranscoder {
    transcodes: Arc<RwLock<Vec<RecordedTranscode>>>,
    fail_inputs: Arc<RwLock<HashSet<PathBuf>>>,
    fail_all: Arc<RwLock<bool>>,
    partial_on_failure: Arc<RwLock<bool>>,
    unavailable: Arc<RwLock<bool>>,
    delay_ms: Arc<RwLock<u64>>,
}

impl MockTranscoder {
    /// Create a new mock transcoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded transcodes.
    pub async fn recorded_transcodes(&self) -> Vec<RecordedTranscode> {
        self.transcodes.read().await.clone()
    }

    /// Get the number of transcodes attempted.
    pub async fn transcode_count(&self) -> usize {
        self.transcodes.read().await.len()
    }

    /// Fail every transcode of `input`.
    pub async fn fail_for(&self, input: impl AsRef<Path>) {
        self.fail_inputs
            .write()
            .await
            .insert(input.as_ref().to_path_buf());
    }

    /// Fail every transcode.
    pub async fn fail_all(&self, fail: bool) {
        *self.fail_all.write().await = fail;
    }

    /// Fail every transcode after leaving a partial output behind.
    pub async fn fail_after_partial_write(&self, fail: bool) {
        *self.fail_all.write().await = fail;
        *self.partial_on_failure.write().await = fail;
    }

    /// Make `validate` report a missing binary.
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    /// Set the simulated transcode duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay_ms.write().await = delay.as_millis() as u64;
    }

    async fn should_fail(&self, input: &Path) -> bool {
        *self.fail_all.read().await || self.fail_inputs.read().await.contains(input)
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        let delay_ms = *self.delay_ms.read().await;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        let fail = self.should_fail(input).await;
        self.transcodes.write().await.push(RecordedTranscode {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            success: !fail,
        });

        if fail {
            if *self.partial_on_failure.read().await {
                tokio::fs::write(output, b"\xff\xfbpartial").await?;
            }
            return Err(TranscodeError::process_failed(
                "injected transcode failure",
                Some("mock stderr".to_string()),
            ));
        }

        let input_bytes = tokio::fs::read(input).await.map_err(|_| TranscodeError::InputNotFound {
            path: input.to_path_buf(),
        })?;
        let mut content = b"\xff\xfb".to_vec();
        content.extend_from_slice(&input_bytes);
        tokio::fs::write(output, content).await?;
        Ok(())
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        if *self.unavailable.read().await {
            return Err(TranscodeError::FfmpegNotFound {
                path: PathBuf::from("mock-ffmpeg"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_transcode_writes_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("a.flac");
        let output = dir.path().join("a.mp3");
        std::fs::write(&input, b"fLaC").unwrap();

        let transcoder = MockTranscoder::new();
        transcoder.transcode(&input, &output).await.unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"\xff\xfbfLaC");
        assert!(input.exists());
        assert_eq!(transcoder.transcode_count().await, 1);
    }

    #[tokio::test]
    async fn test_per_input_failure() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("a.flac");
        std::fs::write(&input, b"fLaC").unwrap();

        let transcoder = MockTranscoder::new();
        transcoder.fail_for(&input).await;

        let result = transcoder.transcode(&input, &dir.path().join("a.mp3")).await;
        assert!(matches!(result, Err(TranscodeError::ProcessFailed { .. })));
        assert!(!transcoder.recorded_transcodes().await[0].success);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let transcoder = MockTranscoder::new();
        assert!(transcoder.validate().await.is_ok());
        transcoder.set_unavailable(true).await;
        assert!(transcoder.validate().await.is_err());
    }
}
