//! Processor module: runs a batch of conversions on a bounded worker pool.
//!
//! The [`BatchCoordinator`] starts one [`WorkerPool`] per batch. Workers pull
//! jobs from a shared queue until it is empty, claim the source path in the
//! in-flight set, run the [`ConversionUnit`](crate::conversion::ConversionUnit)
//! and send the result to the coordinator task, which owns the counters and
//! forwards [`BatchEvent`]s to the caller.
//!
//! # Example
//!
//! ```ignore
//! use ncmconv_core::processor::{BatchCoordinator, BatchEvent, ProcessorConfig};
//!
//! let coordinator = BatchCoordinator::new(ProcessorConfig::default(), unit);
//! let mut batch = coordinator.start_paths(paths, OutputFormat::Both);
//!
//! while let Some(event) = batch.next_event().await {
//!     match event {
//!         BatchEvent::Result { result } => println!("{result:?}"),
//!         BatchEvent::Completed { summary } => println!("{}/{}", summary.completed, summary.total),
//!     }
//! }
//! ```

mod batch;
mod config;
mod pool;
mod types;

pub use batch::{BatchCoordinator, BatchError, BatchHandle};
pub use config::{ProcessorConfig, MAX_WORKERS};
pub use pool::{CancelFlag, InFlight, JobQueue, WorkerPool};
pub use types::{BatchEvent, BatchSummary};
