use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{JobId, JobPriority};

/// Typed lifecycle events for structured observability
///
/// Every state transition the engine commits emits exactly one event.
/// Delivery is at-least-once to current subscribers, synchronous fan-out,
/// no persistence or replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueueEvent {
    /// Job was accepted into the queue
    JobAdded {
        queue: String,
        job_id: JobId,
        job_type: String,
        priority: JobPriority,
        at: DateTime<Utc>,
    },

    /// Job execution started
    JobProcessing {
        queue: String,
        job_id: JobId,
        job_type: String,
        attempt: u32,
        at: DateTime<Utc>,
    },

    /// Job execution reached a terminal outcome (success or permanent failure)
    JobCompleted {
        queue: String,
        job_id: JobId,
        job_type: String,
        success: bool,
        duration_ms: u64,
        at: DateTime<Utc>,
    },

    /// Job failed and a retry was scheduled
    JobRetrying {
        queue: String,
        job_id: JobId,
        job_type: String,
        attempt: u32,
        retry_at: DateTime<Utc>,
        error: String,
        at: DateTime<Utc>,
    },

    /// Job failed permanently
    JobFailed {
        queue: String,
        job_id: JobId,
        job_type: String,
        error: String,
        final_failure: bool,
        at: DateTime<Utc>,
    },

    /// Job was cancelled before it ran
    JobCancelled {
        queue: String,
        job_id: JobId,
        job_type: String,
        at: DateTime<Utc>,
    },

    /// Queue composition changed (counts are a point-in-time snapshot)
    QueueChanged {
        queue: String,
        pending: usize,
        active: usize,
        at: DateTime<Utc>,
    },

    /// Dispatch was paused
    QueuePaused { queue: String, at: DateTime<Utc> },

    /// Dispatch was resumed
    QueueResumed { queue: String, at: DateTime<Utc> },

    /// Queue shut down; counts report work left behind
    QueueShutdown {
        queue: String,
        pending: usize,
        active: usize,
        at: DateTime<Utc>,
    },
}

impl QueueEvent {
    /// Get event type name as string
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::JobAdded { .. } => "job_added",
            Self::JobProcessing { .. } => "job_processing",
            Self::JobCompleted { .. } => "job_completed",
            Self::JobRetrying { .. } => "job_retrying",
            Self::JobFailed { .. } => "job_failed",
            Self::JobCancelled { .. } => "job_cancelled",
            Self::QueueChanged { .. } => "queue_changed",
            Self::QueuePaused { .. } => "queue_paused",
            Self::QueueResumed { .. } => "queue_resumed",
            Self::QueueShutdown { .. } => "queue_shutdown",
        }
    }

    /// Get the queue name from any event
    pub fn queue(&self) -> &str {
        match self {
            Self::JobAdded { queue, .. }
            | Self::JobProcessing { queue, .. }
            | Self::JobCompleted { queue, .. }
            | Self::JobRetrying { queue, .. }
            | Self::JobFailed { queue, .. }
            | Self::JobCancelled { queue, .. }
            | Self::QueueChanged { queue, .. }
            | Self::QueuePaused { queue, .. }
            | Self::QueueResumed { queue, .. }
            | Self::QueueShutdown { queue, .. } => queue,
        }
    }

    /// Get the job ID for job-scoped events
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::JobAdded { job_id, .. }
            | Self::JobProcessing { job_id, .. }
            | Self::JobCompleted { job_id, .. }
            | Self::JobRetrying { job_id, .. }
            | Self::JobFailed { job_id, .. }
            | Self::JobCancelled { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    /// Get the timestamp from any event
    pub fn timestamp(&self) -> &DateTime<Utc> {
        match self {
            Self::JobAdded { at, .. }
            | Self::JobProcessing { at, .. }
            | Self::JobCompleted { at, .. }
            | Self::JobRetrying { at, .. }
            | Self::JobFailed { at, .. }
            | Self::JobCancelled { at, .. }
            | Self::QueueChanged { at, .. }
            | Self::QueuePaused { at, .. }
            | Self::QueueResumed { at, .. }
            | Self::QueueShutdown { at, .. } => at,
        }
    }
}
