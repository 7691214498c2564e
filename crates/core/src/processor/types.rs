//! Types for the processor module.

use serde::{Deserialize, Serialize};

use crate::conversion::ConversionResult;

/// Event delivered to the presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    /// One job finished, successfully or not.
    Result { result: ConversionResult },
    /// Every job has reported. Sent exactly once, last.
    Completed { summary: BatchSummary },
}

/// Final counters of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Counters owned by the coordinator task.
#[derive(Debug, Clone, Default)]
pub(crate) struct BatchState {
    total: usize,
    completed: usize,
    succeeded: usize,
}

impl BatchState {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Counts one result. Returns false when the batch was already complete.
    pub(crate) fn record(&mut self, result: &ConversionResult) -> bool {
        if self.is_complete() {
            return false;
        }
        self.completed += 1;
        if result.is_success() {
            self.succeeded += 1;
        }
        true
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.completed >= self.total
    }

    pub(crate) fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.total,
            completed: self.completed,
            succeeded: self.succeeded,
            failed: self.completed - self.succeeded,
        }
    }
}
