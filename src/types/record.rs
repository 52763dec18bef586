use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::Job;
use crate::types::{JobId, JobPriority};

/// Job status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is queued and waiting to be dispatched
    Pending,

    /// Job is currently executing
    Active,

    /// Job completed successfully
    Completed,

    /// Job failed permanently (retry budget exhausted or permanent error)
    Failed,

    /// Job failed and is waiting for its retry delay to elapse
    Retrying,

    /// Job was routed to the dead-letter list after permanent failure
    Dead,
}

impl JobStatus {
    /// Check if the job is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Dead)
    }

    /// Check if the job can still be cancelled without cooperation
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Retrying)
    }

    /// Get the status name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Retrying => "retrying",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Queued job - mutable runtime state tracked by the engine
///
/// Exactly one record per job id exists in the engine's job table; a record
/// sits in at most one of the pending/active/completed/failed/dead-letter
/// collections, except while `Retrying`, when it lives in the table only
/// until `next_retry_at` elapses.
#[derive(Clone)]
pub struct QueuedJob {
    /// The submitted unit of work
    pub job: Arc<dyn Job>,

    /// Current job status
    pub status: JobStatus,

    /// When the job was added to the queue
    pub added_at: DateTime<Utc>,

    /// Number of failed attempts so far (starts at 0)
    pub retry_count: u32,

    /// When the job becomes eligible again while retrying
    pub next_retry_at: Option<DateTime<Utc>>,

    /// When the current or last execution started
    pub processing_started_at: Option<DateTime<Utc>>,

    /// Last error message (if any)
    pub last_error: Option<String>,

    /// Submitter-supplied metadata, opaque to the engine
    pub metadata: Option<serde_json::Value>,
}

impl QueuedJob {
    /// Create a new pending record for a submitted job
    pub fn new(job: Arc<dyn Job>, metadata: Option<serde_json::Value>) -> Self {
        Self {
            job,
            status: JobStatus::Pending,
            added_at: Utc::now(),
            retry_count: 0,
            next_retry_at: None,
            processing_started_at: None,
            last_error: None,
            metadata,
        }
    }

    /// Get the job ID
    pub fn id(&self) -> JobId {
        self.job.id()
    }

    /// Get the job type tag
    pub fn job_type(&self) -> String {
        self.job.job_type().to_string()
    }

    /// Get the job priority
    pub fn priority(&self) -> JobPriority {
        self.job.priority()
    }

    /// Attempt number the next (or current) execution runs as
    pub fn attempt(&self) -> u32 {
        self.retry_count + 1
    }

    /// Mark the record active at the start of an execution
    pub fn start_processing(&mut self) {
        self.status = JobStatus::Active;
        self.processing_started_at = Some(Utc::now());
    }

    /// Complete the record successfully
    pub fn complete(&mut self) {
        self.status = JobStatus::Completed;
    }

    /// Schedule a retry after a failed attempt
    pub fn schedule_retry(&mut self, retry_at: DateTime<Utc>, error: String) {
        self.status = JobStatus::Retrying;
        self.next_retry_at = Some(retry_at);
        self.last_error = Some(error);
    }

    /// Promote a due retry back to pending
    pub fn promote(&mut self) {
        self.status = JobStatus::Pending;
        self.next_retry_at = None;
    }

    /// Fail the record permanently
    pub fn fail(&mut self, error: String) {
        self.status = JobStatus::Failed;
        self.next_retry_at = None;
        self.last_error = Some(error);
    }

    /// Route a permanently failed record to the dead-letter list
    pub fn mark_dead(&mut self) {
        self.status = JobStatus::Dead;
    }

    /// Whether the retry delay has elapsed
    pub fn retry_due(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, JobStatus::Retrying)
            && self.next_retry_at.map(|at| at <= now).unwrap_or(false)
    }
}

impl fmt::Debug for QueuedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedJob")
            .field("id", &self.id())
            .field("job_type", &self.job.job_type())
            .field("priority", &self.priority())
            .field("status", &self.status)
            .field("added_at", &self.added_at)
            .field("retry_count", &self.retry_count)
            .field("next_retry_at", &self.next_retry_at)
            .field("processing_started_at", &self.processing_started_at)
            .field("last_error", &self.last_error)
            .finish()
    }
}
