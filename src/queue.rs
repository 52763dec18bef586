use std::collections::VecDeque;

use crate::types::{JobId, JobPriority};

/// Ordered pending list: higher priority first, FIFO within a priority
///
/// Insertion places an entry after all existing entries with priority
/// greater than or equal to its own and before all entries with lower
/// priority. The engine guarantees each job enters at most once per pending
/// episode, so no duplicate detection happens here.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: VecDeque<PendingEntry>,
}

#[derive(Debug, Clone)]
struct PendingEntry {
    job_id: JobId,
    priority: JobPriority,
}

impl PendingQueue {
    /// Create an empty pending queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job in priority order
    pub fn insert(&mut self, job_id: JobId, priority: JobPriority) {
        let pos = self
            .entries
            .iter()
            .position(|entry| entry.priority < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, PendingEntry { job_id, priority });
    }

    /// Remove and return the highest-priority entry
    pub fn pop_highest(&mut self) -> Option<JobId> {
        self.entries.pop_front().map(|entry| entry.job_id)
    }

    /// Remove a specific job, returning whether it was present
    pub fn remove(&mut self, job_id: &JobId) -> bool {
        match self.entries.iter().position(|entry| &entry.job_id == job_id) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Whether a job is currently queued
    pub fn contains(&self, job_id: &JobId) -> bool {
        self.entries.iter().any(|entry| &entry.job_id == job_id)
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
