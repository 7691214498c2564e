//! Batch coordinator: owns the counters of one run and reports completion.

use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::config::ProcessorConfig;
use super::pool::{CancelFlag, WorkerPool};
use super::types::{BatchEvent, BatchState, BatchSummary};
use crate::conversion::{output_key, ConversionJob, ConversionResult, ConversionUnit, OutputFormat};

/// Error type for batch operations.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The coordinator task did not run to completion.
    #[error("Batch coordinator aborted: {0}")]
    Aborted(String),
}

/// Starts batches. One coordinator task and one worker pool per batch.
pub struct BatchCoordinator {
    config: ProcessorConfig,
    unit: ConversionUnit,
}

impl BatchCoordinator {
    pub fn new(config: ProcessorConfig, unit: ConversionUnit) -> Self {
        Self { config, unit }
    }

    /// Starts a batch for `paths`, all sharing `format`.
    pub fn start_paths(
        &self,
        paths: impl IntoIterator<Item = PathBuf>,
        format: OutputFormat,
    ) -> BatchHandle {
        self.start(
            paths
                .into_iter()
                .map(|path| ConversionJob::new(path, format))
                .collect(),
        )
    }

    /// Starts a batch. Sources that resolve to the same outputs are dropped
    /// before counting, keeping the first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, jobs: Vec<ConversionJob>) -> BatchHandle {
        let jobs = dedup(jobs);
        let total = jobs.len();
        let buffer = self.config.event_buffer.max(1);

        let (result_tx, result_rx) = mpsc::channel(buffer);
        let (event_tx, event_rx) = mpsc::channel(buffer);
        let cancel = CancelFlag::new();

        info!(total, workers = self.config.worker_count(), "Starting batch");

        let pool = WorkerPool::new(self.unit.clone(), self.config.worker_count());
        let pool_cancel = cancel.clone();
        tokio::spawn(async move { pool.run(jobs, result_tx, pool_cancel).await });

        let coordinator = tokio::spawn(coordinate(total, result_rx, event_tx));

        BatchHandle {
            total,
            events: event_rx,
            cancel,
            coordinator,
        }
    }
}

/// Keeps the first job for every output key.
fn dedup(jobs: Vec<ConversionJob>) -> Vec<ConversionJob> {
    let mut seen = HashSet::new();
    jobs.into_iter()
        .filter(|job| {
            let fresh = seen.insert(output_key(&job.source_path));
            if !fresh {
                warn!(source = %job.source_path.display(), "Duplicate source dropped from batch");
            }
            fresh
        })
        .collect()
}

/// Counts results, forwards them, and emits `Completed` exactly once.
async fn coordinate(
    total: usize,
    mut results: mpsc::Receiver<ConversionResult>,
    events: mpsc::Sender<BatchEvent>,
) -> BatchSummary {
    let mut state = BatchState::new(total);
    let mut completion_sent = false;

    if state.is_complete() {
        completion_sent = true;
        let _ = events
            .send(BatchEvent::Completed {
                summary: state.summary(),
            })
            .await;
    }

    while let Some(result) = results.recv().await {
        if !state.record(&result) {
            warn!(
                source = %result.source_path().display(),
                "Result received after batch completion"
            );
            continue;
        }

        let _ = events.send(BatchEvent::Result { result }).await;

        if state.is_complete() && !completion_sent {
            completion_sent = true;
            let summary = state.summary();
            info!(
                completed = summary.completed,
                total = summary.total,
                failed = summary.failed,
                "Batch completed"
            );
            let _ = events.send(BatchEvent::Completed { summary }).await;
        }
    }

    // Workers are gone; report whatever was counted so the caller is never left waiting
    if !completion_sent {
        let summary = state.summary();
        warn!(
            completed = summary.completed,
            total = summary.total,
            "Workers exited before every job reported"
        );
        let _ = events.send(BatchEvent::Completed { summary }).await;
    }

    state.summary()
}

/// Caller's side of a running batch.
pub struct BatchHandle {
    total: usize,
    events: mpsc::Receiver<BatchEvent>,
    cancel: CancelFlag,
    coordinator: JoinHandle<BatchSummary>,
}

impl BatchHandle {
    /// Number of jobs in the batch after de-duplication.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Next event, or `None` after `Completed` has been delivered.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Stops dispatching new jobs. Every remaining job reports `Cancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clonable flag that cancels this batch, for signal handlers.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Drains every remaining event.
    pub async fn collect_events(mut self) -> Vec<BatchEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        events
    }

    /// Discards remaining events and waits for the final counters.
    pub async fn wait(self) -> Result<BatchSummary, BatchError> {
        drop(self.events);
        self.coordinator
            .await
            .map_err(|e| BatchError::Aborted(e.to_string()))
    }
}
