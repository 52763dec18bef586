use std::time::Duration;

use thiserror::Error;

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Operational and configuration errors for queue operations
///
/// Job execution errors never surface through this type; they are contained
/// by the engine and reported via events and statistics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("job id must not be empty")]
    EmptyJobId,

    #[error("duplicate job id: {0}")]
    DuplicateJob(String),

    #[error("queue is shut down")]
    ShutDown,

    #[error("invalid queue configuration: {0}")]
    InvalidConfig(String),
}

/// Job execution outcome - determines retry behavior
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Retryable error - a retry is scheduled if attempts remain
    #[error("retryable error: {0}")]
    Retryable(String),

    /// Permanent error - fail immediately, no retry
    #[error("permanent error: {0}")]
    Permanent(String),

    /// Execution exceeded the configured processing timeout
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl JobError {
    /// Create a retryable error
    pub fn retryable(msg: impl Into<String>) -> Self {
        Self::Retryable(msg.into())
    }

    /// Create a permanent error
    pub fn permanent(msg: impl Into<String>) -> Self {
        Self::Permanent(msg.into())
    }

    /// Check if this error is retryable
    ///
    /// Timeouts count as retryable: for retry purposes they are
    /// indistinguishable from any other execution error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_) | Self::TimedOut(_))
    }

    /// Get the error message
    pub fn message(&self) -> String {
        self.to_string()
    }
}
