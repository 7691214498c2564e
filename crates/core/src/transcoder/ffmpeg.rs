//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::traits::Transcoder;

/// LAME encoder used for the lossy output.
const MP3_CODEC: &str = "libmp3lame";

/// FFmpeg-based transcoder implementation.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Builds the fixed ffmpeg argument list.
    fn build_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-y".to_string(), // Overwrite output
            "-acodec".to_string(),
            MP3_CODEC.to_string(),
            "-ab".to_string(),
            format!("{}k", self.config.bitrate_kbps),
        ];

        args.extend(self.config.extra_args.iter().cloned());
        args.push(output.to_string_lossy().to_string());
        args
    }

    fn spawn_error(&self, e: std::io::Error) -> TranscodeError {
        if e.kind() == std::io::ErrorKind::NotFound {
            TranscodeError::FfmpegNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            TranscodeError::Io(e)
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        if !input.exists() {
            return Err(TranscodeError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        let start = Instant::now();
        let args = self.build_args(input, output);

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TranscodeError::process_failed("stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut error_output = String::new();
            while let Ok(Some(line)) = reader.next_line().await {
                error_output.push_str(&line);
                error_output.push('\n');
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    let error_output = error_output.trim();
                    return Err(TranscodeError::process_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        (!error_output.is_empty()).then(|| error_output.to_string()),
                    ));
                }
            }
            Ok(Err(e)) => return Err(TranscodeError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                return Err(TranscodeError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(TranscodeError::MissingOutput {
                path: output.to_path_buf(),
            });
        }

        debug!(
            input = %input.display(),
            output = %output.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Transcode finished"
        );
        Ok(())
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(TranscodeError::process_failed(
                "ffmpeg -version failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }
        Ok(())
    }
}
