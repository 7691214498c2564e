//! Configuration for the processor module.

use serde::{Deserialize, Serialize};

/// Hard cap on concurrent workers, regardless of hardware.
pub const MAX_WORKERS: usize = 4;

/// Configuration for the worker pool and batch coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Requested number of workers; clamped to `1..=MAX_WORKERS` when used.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Capacity of the result and event channels.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_max_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_WORKERS)
}

fn default_event_buffer() -> usize {
    64
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl ProcessorConfig {
    /// Sets the requested number of workers.
    pub fn with_max_workers(mut self, max: usize) -> Self {
        self.max_workers = max;
        self
    }

    /// Sets the channel capacity.
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    /// Number of workers a batch actually spawns.
    pub fn worker_count(&self) -> usize {
        self.max_workers.clamp(1, MAX_WORKERS)
    }
}
