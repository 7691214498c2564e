//! Job queue, in-flight set and the workers that drain them.

use futures::future::join_all;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::conversion::{
    resolve_output_key, ConversionJob, ConversionResult, ConversionUnit, FailureKind,
};

/// Pending jobs. Filled once before the workers start; drained without blocking.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: Mutex<VecDeque<ConversionJob>>,
}

impl JobQueue {
    pub fn new(jobs: impl IntoIterator<Item = ConversionJob>) -> Self {
        Self {
            jobs: Mutex::new(jobs.into_iter().collect()),
        }
    }

    /// Takes the next job, or `None` once the queue is empty.
    pub async fn pop(&self) -> Option<ConversionJob> {
        self.jobs.lock().await.pop_front()
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}

/// Output keys of the sources currently held by a worker.
#[derive(Debug, Default)]
pub struct InFlight {
    paths: Mutex<HashSet<PathBuf>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `path`. Returns false when another worker already holds it.
    ///
    /// Callers pass a [`resolve_output_key`] so aliases of one file collide.
    pub async fn try_claim(&self, path: &Path) -> bool {
        self.paths.lock().await.insert(path.to_path_buf())
    }

    pub async fn release(&self, path: &Path) {
        self.paths.lock().await.remove(path);
    }

    pub async fn contains(&self, path: &Path) -> bool {
        self.paths.lock().await.contains(path)
    }

    pub async fn len(&self) -> usize {
        self.paths.lock().await.len()
    }
}

/// Cooperative cancellation flag shared by a batch's workers.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Jobs already running finish normally.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fixed-size set of workers running [`ConversionUnit`]s.
pub struct WorkerPool {
    unit: ConversionUnit,
    workers: usize,
}

impl WorkerPool {
    pub fn new(unit: ConversionUnit, workers: usize) -> Self {
        Self {
            unit,
            workers: workers.max(1),
        }
    }

    /// Runs every job, sending exactly one result per job to `results`.
    ///
    /// Returns once the queue is drained and every worker has exited.
    pub async fn run(
        &self,
        jobs: Vec<ConversionJob>,
        results: mpsc::Sender<ConversionResult>,
        cancel: CancelFlag,
    ) {
        let workers = self.workers.min(jobs.len());
        let queue = Arc::new(JobQueue::new(jobs));
        let in_flight = Arc::new(InFlight::new());

        debug!(workers, "Starting worker pool");
        let handles: Vec<_> = (0..workers)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    self.unit.clone(),
                    Arc::clone(&queue),
                    Arc::clone(&in_flight),
                    results.clone(),
                    cancel.clone(),
                ))
            })
            .collect();
        drop(results);

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                warn!(error = %e, "Worker task ended abnormally");
            }
        }
    }
}

async fn worker_loop(
    id: usize,
    unit: ConversionUnit,
    queue: Arc<JobQueue>,
    in_flight: Arc<InFlight>,
    results: mpsc::Sender<ConversionResult>,
    cancel: CancelFlag,
) {
    while let Some(job) = queue.pop().await {
        let result = if cancel.is_cancelled() {
            ConversionResult::failure(&job.source_path, FailureKind::Cancelled, "batch cancelled")
        } else {
            claim_and_run(id, &unit, &in_flight, &job).await
        };

        if results.send(result).await.is_err() {
            debug!(worker = id, "Result receiver dropped");
        }
    }
    debug!(worker = id, "Queue drained, worker exiting");
}

/// Runs `job` unless another worker holds a source with the same outputs.
async fn claim_and_run(
    id: usize,
    unit: &ConversionUnit,
    in_flight: &InFlight,
    job: &ConversionJob,
) -> ConversionResult {
    let key = resolve_output_key(&job.source_path).await;
    if !in_flight.try_claim(&key).await {
        warn!(
            worker = id,
            source = %job.source_path.display(),
            "Source already in flight, skipping"
        );
        return ConversionResult::failure(
            &job.source_path,
            FailureKind::InFlight,
            "already being converted by another worker",
        );
    }

    debug!(worker = id, source = %job.source_path.display(), "Picked up job");
    let result = unit.run(job).await;
    in_flight.release(&key).await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::OutputFormat;

    #[tokio::test]
    async fn test_queue_drains_in_order() {
        let queue = JobQueue::new(vec![
            ConversionJob::new("/a.ncm", OutputFormat::Lossy),
            ConversionJob::new("/b.ncm", OutputFormat::Lossy),
        ]);
        assert_eq!(queue.len().await, 2);
        assert_eq!(queue.pop().await.unwrap().source_path, PathBuf::from("/a.ncm"));
        assert_eq!(queue.pop().await.unwrap().source_path, PathBuf::from("/b.ncm"));
        assert!(queue.pop().await.is_none());
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_in_flight_claim_is_exclusive() {
        let in_flight = Arc::new(InFlight::new());
        let path = PathBuf::from("/music/a.ncm");

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let in_flight = Arc::clone(&in_flight);
                let path = path.clone();
                tokio::spawn(async move { in_flight.try_claim(&path).await })
            })
            .collect();

        let claimed = join_all(handles)
            .await
            .into_iter()
            .filter(|r| *r.as_ref().unwrap())
            .count();
        assert_eq!(claimed, 1);
        assert!(in_flight.contains(&path).await);

        in_flight.release(&path).await;
        assert_eq!(in_flight.len().await, 0);
        assert!(in_flight.try_claim(&path).await);
    }

    #[test]
    fn test_cancel_flag_shared() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }
}
