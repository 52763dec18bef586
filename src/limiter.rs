use tokio::time::Instant;

/// Token-bucket admission control for job dispatch
///
/// The bucket starts full and refills continuously at `rate` tokens per
/// second, capped at `capacity` (= the configured rate). Constructed without
/// a rate it admits everything. The limiter has a single owner - the engine
/// state behind its mutex - so it carries no locking of its own.
#[derive(Debug)]
pub struct RateLimiter {
    rate: Option<f64>,
    capacity: f64,
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Create a limiter admitting `rate` jobs per second, or unlimited
    pub fn new(rate: Option<f64>) -> Self {
        let capacity = rate.unwrap_or(0.0);
        Self {
            rate,
            capacity,
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    /// Add tokens for the time elapsed since the last refill
    pub fn refill(&mut self) {
        let Some(rate) = self.rate else { return };
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Take one token if available
    pub fn try_acquire(&mut self) -> bool {
        if self.rate.is_none() {
            return true;
        }
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens currently available
    pub fn available(&self) -> f64 {
        if self.rate.is_none() {
            f64::INFINITY
        } else {
            self.tokens
        }
    }
}
