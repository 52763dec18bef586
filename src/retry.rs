use std::time::Duration;

use rand::Rng;

use crate::error::JobError;

/// Default jitter fraction applied to the exponential term
const DEFAULT_JITTER_RATIO: f64 = 0.1;

/// Exponential-backoff-with-jitter retry policy
///
/// The delay for attempt `n` (1-based) is `base * 2^(n-1)` plus a random
/// jitter of up to 10% of that value, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
    jitter_ratio: f64,
}

impl RetryPolicy {
    /// Create a policy with the given base delay and cap
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            jitter_ratio: DEFAULT_JITTER_RATIO,
        }
    }

    /// Override the jitter fraction (0.0 disables jitter)
    pub fn with_jitter_ratio(mut self, ratio: f64) -> Self {
        self.jitter_ratio = ratio.max(0.0);
        self
    }

    /// Compute the delay before the given attempt is retried
    pub fn compute_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let exponential_ms =
            self.base_delay.as_millis() as f64 * 2_f64.powi(exponent as i32);
        let jitter_ms = if exponential_ms > 0.0 && self.jitter_ratio > 0.0 {
            rand::thread_rng().gen_range(0.0..exponential_ms) * self.jitter_ratio
        } else {
            0.0
        };
        let total_ms = (exponential_ms + jitter_ms).min(self.max_delay.as_millis() as f64);
        Duration::from_millis(total_ms as u64)
    }

    /// Decide whether a failed attempt is eligible for another try
    ///
    /// The job's own predicate is consulted separately by the engine; this
    /// gate covers the attempt budget and the error classification.
    pub fn should_retry(&self, error: &JobError, attempt: u32, max_attempts: u32) -> bool {
        attempt < max_attempts && error.is_retryable()
    }
}
