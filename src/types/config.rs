use std::time::Duration;

use crate::error::{QueueError, QueueResult};

/// Configuration for a queue engine
///
/// Validated once at engine construction; invalid values are fatal there and
/// can never occur mid-run.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Queue name, carried on every emitted event
    pub name: String,
    /// Maximum number of concurrently executing jobs
    pub max_concurrency: usize,
    /// Default retry budget for jobs that do not override it
    pub max_retries: u32,
    /// Base delay for exponential retry backoff
    pub retry_delay_base: Duration,
    /// Upper bound on a single retry delay
    pub max_retry_delay: Duration,
    /// Per-execution timeout; `None` lets jobs run unbounded
    pub processing_timeout: Option<Duration>,
    /// Route permanently failed jobs to the dead-letter list
    pub enable_dead_letter_queue: bool,
    /// Token-bucket admission rate; `None` disables rate limiting
    pub rate_limit_per_second: Option<f64>,
    /// How often the dispatch tick runs
    pub dispatch_interval: Duration,
    /// How often due retries are promoted back to pending
    pub retry_scan_interval: Duration,
    /// How long shutdown waits for active jobs to drain
    pub shutdown_timeout: Duration,
    /// Capacity of the broadcast event channel
    pub event_buffer: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_concurrency: 5,
            max_retries: 3,
            retry_delay_base: Duration::from_millis(1000),
            max_retry_delay: Duration::from_millis(30_000),
            processing_timeout: None,
            enable_dead_letter_queue: true,
            rate_limit_per_second: None,
            dispatch_interval: Duration::from_millis(100),
            retry_scan_interval: Duration::from_millis(1000),
            shutdown_timeout: Duration::from_millis(30_000),
            event_buffer: 1024,
        }
    }
}

impl QueueConfig {
    /// Create a configuration with the given queue name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the maximum number of concurrent executions
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Set the default retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base retry delay
    pub fn with_retry_delay_base(mut self, base: Duration) -> Self {
        self.retry_delay_base = base;
        self
    }

    /// Set the retry delay cap
    pub fn with_max_retry_delay(mut self, max: Duration) -> Self {
        self.max_retry_delay = max;
        self
    }

    /// Set the per-execution timeout
    pub fn with_processing_timeout(mut self, timeout: Duration) -> Self {
        self.processing_timeout = Some(timeout);
        self
    }

    /// Enable or disable dead-letter routing
    pub fn with_dead_letter_queue(mut self, enabled: bool) -> Self {
        self.enable_dead_letter_queue = enabled;
        self
    }

    /// Set the token-bucket admission rate
    pub fn with_rate_limit_per_second(mut self, rate: f64) -> Self {
        self.rate_limit_per_second = Some(rate);
        self
    }

    /// Set the dispatch tick interval
    pub fn with_dispatch_interval(mut self, interval: Duration) -> Self {
        self.dispatch_interval = interval;
        self
    }

    /// Set the retry promotion scan interval
    pub fn with_retry_scan_interval(mut self, interval: Duration) -> Self {
        self.retry_scan_interval = interval;
        self
    }

    /// Set the shutdown drain timeout
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> QueueResult<()> {
        if self.name.is_empty() {
            return Err(QueueError::InvalidConfig("queue name is empty".into()));
        }
        if self.max_concurrency == 0 {
            return Err(QueueError::InvalidConfig(
                "max_concurrency must be at least 1".into(),
            ));
        }
        if self.retry_delay_base.is_zero() {
            return Err(QueueError::InvalidConfig(
                "retry_delay_base must be positive".into(),
            ));
        }
        if self.max_retry_delay < self.retry_delay_base {
            return Err(QueueError::InvalidConfig(
                "max_retry_delay must not be below retry_delay_base".into(),
            ));
        }
        if let Some(rate) = self.rate_limit_per_second {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(QueueError::InvalidConfig(
                    "rate_limit_per_second must be positive".into(),
                ));
            }
        }
        if let Some(timeout) = self.processing_timeout {
            if timeout.is_zero() {
                return Err(QueueError::InvalidConfig(
                    "processing_timeout must be positive".into(),
                ));
            }
        }
        if self.dispatch_interval.is_zero() || self.retry_scan_interval.is_zero() {
            return Err(QueueError::InvalidConfig(
                "timer intervals must be positive".into(),
            ));
        }
        if self.event_buffer == 0 {
            return Err(QueueError::InvalidConfig(
                "event_buffer must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
