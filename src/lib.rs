//! # jobline: In-Process Priority Job Queue
//!
//! **Priority-ordered, retry-capable, rate-limited task scheduling**
//!
//! jobline decouples task submission from execution: producers hand the
//! engine opaque units of work, and the engine takes it from there -
//! priority dispatch, token-bucket admission, exponential-backoff retries
//! with jitter, dead-letter routing, and bounded-time graceful shutdown.
//!
//! ## Features
//!
//! - **Priority dispatch**: higher priority first, FIFO among equals
//! - **Controlled concurrency**: a hard cap on simultaneously running jobs
//! - **Token-bucket rate limiting**: bound how many jobs start per second
//! - **Backoff retries**: exponential delay with 10% jitter, capped, with
//!   per-job budgets and custom retry predicates
//! - **Dead-letter routing**: exhausted jobs are parked for inspection,
//!   never silently dropped
//! - **Structured events**: every state transition emits a typed event on a
//!   broadcast stream - no compile-time dependency on subscribers
//! - **Graceful shutdown**: in-flight work drains within a bounded timeout
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jobline::prelude::*;
//!
//! struct SendReceipt {
//!     order: String,
//! }
//!
//! #[async_trait]
//! impl Job for SendReceipt {
//!     fn id(&self) -> JobId {
//!         JobId::from(format!("receipt-{}", self.order))
//!     }
//!
//!     fn job_type(&self) -> &str {
//!         "send_receipt"
//!     }
//!
//!     fn priority(&self) -> JobPriority {
//!         JobPriority::HIGH
//!     }
//!
//!     async fn execute(&self) -> Result<(), JobError> {
//!         // ... talk to the mail provider ...
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() -> Result<(), jobline::QueueError> {
//! let engine = QueueEngine::new(
//!     QueueConfig::new("mail")
//!         .with_max_concurrency(4)
//!         .with_rate_limit_per_second(10.0),
//! )?;
//! engine.start();
//!
//! let mut events = engine.subscribe();
//! engine.add_job(SendReceipt { order: "A-1042".into() })?;
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{}: {:?}", event.event_name(), event.job_id());
//! }
//!
//! engine.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod job;
pub mod limiter;
pub mod queue;
pub mod retry;
pub mod types;

// Core API exports
pub use engine::{BoxStream, QueueEngine};
pub use error::{JobError, QueueError, QueueResult};
pub use job::Job;
pub use limiter::RateLimiter;
pub use queue::PendingQueue;
pub use retry::RetryPolicy;
pub use types::{
    JobId, JobPriority, JobStatus, QueueConfig, QueueEvent, QueueStats, QueuedJob,
};

/// Everything needed to define and run jobs
pub mod prelude {
    // Engine and configuration
    pub use crate::{QueueConfig, QueueEngine};

    // Job contract
    pub use crate::{Job, JobError, JobId, JobPriority};

    // Observability
    pub use crate::{JobStatus, QueueEvent, QueueStats};

    // Results
    pub use crate::{QueueError, QueueResult};

    // Essential traits
    pub use async_trait::async_trait;
}
