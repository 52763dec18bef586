use async_trait::async_trait;

use crate::error::JobError;
use crate::types::{JobId, JobPriority};

/// Trait for defining units of work processed by the queue
///
/// A job is owned by its submitter until enqueued; afterwards the engine
/// owns it exclusively until it reaches a terminal state. Implementations
/// must be safe to share across tasks - the engine holds jobs behind `Arc`.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Unique identity of this job within a queue instance
    fn id(&self) -> JobId;

    /// Free-form type tag used for grouping in events and metrics
    fn job_type(&self) -> &str;

    /// Dispatch priority (default: normal)
    fn priority(&self) -> JobPriority {
        JobPriority::NORMAL
    }

    /// Per-job retry budget; `None` uses the queue default
    fn max_retries(&self) -> Option<u32> {
        None
    }

    /// Execute the job's work
    async fn execute(&self) -> Result<(), JobError>;

    /// Cooperative cancellation hook
    ///
    /// Invoked when the job is cancelled while pending or retrying. An
    /// in-flight execution is never interrupted; implementations that want
    /// mid-run cancellation must observe their own signal from here.
    async fn on_cancel(&self) {}

    /// Custom retry predicate, consulted after the attempt budget and the
    /// error's own classification both allow a retry
    fn should_retry(&self, error: &JobError, attempt: u32) -> bool {
        let _ = (error, attempt);
        true
    }
}
