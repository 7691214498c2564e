//! Per-file conversion: decode, optional transcode, cleanup, tagging.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::error::ConversionError;
use super::paths::{discard, is_lossy_output, remove_if_exists, OutputPaths};
use super::types::{ConversionJob, ConversionResult, MetadataRecord};
use crate::decoder::{decode_to, Decoder};
use crate::tagger::{TagError, Tagger};
use crate::transcoder::Transcoder;

/// Stages a job moves through. `Failed` is reachable from every other stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Decoding,
    Transcoding,
    Tagging,
    Done,
    Failed,
}

/// Files kept by a successful job plus any swallowed tag problems.
struct Converted {
    outputs: Vec<PathBuf>,
    warnings: Vec<String>,
}

/// Runs one [`ConversionJob`] against the three collaborators.
#[derive(Clone)]
pub struct ConversionUnit {
    decoder: Arc<dyn Decoder>,
    transcoder: Arc<dyn Transcoder>,
    tagger: Arc<dyn Tagger>,
}

impl ConversionUnit {
    pub fn new(
        decoder: Arc<dyn Decoder>,
        transcoder: Arc<dyn Transcoder>,
        tagger: Arc<dyn Tagger>,
    ) -> Self {
        Self {
            decoder,
            transcoder,
            tagger,
        }
    }

    /// Converts one file. Never fails: errors become a `Failure` result after
    /// both output paths have been cleaned up.
    pub async fn run(&self, job: &ConversionJob) -> ConversionResult {
        let start = Instant::now();
        let paths = OutputPaths::for_source(&job.source_path);
        let mut stage = Stage::Pending;

        match self.convert(job, &paths, &mut stage).await {
            Ok(converted) => {
                enter(job, &mut stage, Stage::Done);
                info!(
                    source = %job.source_path.display(),
                    outputs = converted.outputs.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Conversion succeeded"
                );
                ConversionResult::Success {
                    source_path: job.source_path.clone(),
                    output_paths: converted.outputs,
                    warnings: converted.warnings,
                }
            }
            Err(e) => {
                let failed_in = stage;
                enter(job, &mut stage, Stage::Failed);
                for path in paths.both() {
                    discard(path).await;
                }
                warn!(
                    source = %job.source_path.display(),
                    stage = ?failed_in,
                    error = %e,
                    "Conversion failed"
                );
                ConversionResult::failure(job.source_path.clone(), e.kind(), e.message())
            }
        }
    }

    async fn convert(
        &self,
        job: &ConversionJob,
        paths: &OutputPaths,
        stage: &mut Stage,
    ) -> Result<Converted, ConversionError> {
        // No stale outputs from an earlier run of the same file
        for path in paths.both() {
            remove_if_exists(path)
                .await
                .map_err(|e| ConversionError::io(path, e))?;
        }
        if let Some(dir) = paths.output_dir() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| ConversionError::io(dir, e))?;
        }

        enter(job, stage, Stage::Decoding);
        let metadata = decode_to(self.decoder.as_ref(), &job.source_path, &paths.lossless).await?;

        let format = job.requested_format;
        if format.needs_transcode() {
            enter(job, stage, Stage::Transcoding);
            self.transcoder
                .transcode(&paths.lossless, &paths.lossy)
                .await?;
            if !format.keeps_lossless() {
                remove_if_exists(&paths.lossless)
                    .await
                    .map_err(|e| ConversionError::io(&paths.lossless, e))?;
            }
        }

        enter(job, stage, Stage::Tagging);
        let outputs = paths.kept(format);
        let warnings = self.tag_outputs(&outputs, &metadata).await;

        Ok(Converted { outputs, warnings })
    }

    /// Tags every lossy output. Failures are logged and returned as warnings.
    async fn tag_outputs(&self, outputs: &[PathBuf], metadata: &MetadataRecord) -> Vec<String> {
        if metadata.is_empty() {
            return Vec::new();
        }

        let mut warnings = Vec::new();
        for path in outputs.iter().filter(|p| is_lossy_output(p)) {
            let tagger = Arc::clone(&self.tagger);
            let target = path.clone();
            let record = metadata.clone();
            let result = tokio::task::spawn_blocking(move || tagger.tag(&target, &record))
                .await
                .unwrap_or_else(|e| Err(TagError::Aborted(e.to_string())));

            if let Err(e) = result {
                warn!(path = %path.display(), error = %e, "Tagging skipped");
                warnings.push(e.to_string());
            }
        }
        warnings
    }
}

fn enter(job: &ConversionJob, stage: &mut Stage, next: Stage) {
    debug!(source = %job.source_path.display(), from = ?*stage, to = ?next, "Stage");
    *stage = next;
}
