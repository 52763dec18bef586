use std::time::Duration;

use serde::Serialize;

/// Point-in-time queue statistics
///
/// Computed on demand from the engine's job table and accumulators, never
/// persisted. `total_processed` and `average_processing_time` survive
/// `clear_completed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStats {
    /// Queue name
    pub name: String,
    /// Jobs waiting to be dispatched
    pub pending: usize,
    /// Jobs currently executing
    pub active: usize,
    /// Jobs that completed successfully (still in the job table)
    pub completed: usize,
    /// Jobs that failed permanently without dead-letter routing
    pub failed: usize,
    /// Jobs waiting out a retry delay
    pub retrying: usize,
    /// Jobs parked on the dead-letter list
    pub dead: usize,
    /// Executions that reached a terminal outcome
    pub total_processed: u64,
    /// Mean execution duration over `total_processed`
    pub average_processing_time: Duration,
    /// Time since the engine was constructed
    pub uptime: Duration,
}

impl QueueStats {
    /// Total number of records currently in the job table
    pub fn total_jobs(&self) -> usize {
        self.pending + self.active + self.completed + self.failed + self.retrying + self.dead
    }
}
