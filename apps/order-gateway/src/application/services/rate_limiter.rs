//! Token-bucket rate limiter for broker traffic.
//!
//! One limiter instance sits in front of the broker client and is shared
//! by every caller. Permits are granted in request-arrival order: the
//! bucket lives behind a fair async mutex, and a caller that must wait
//! for refill holds the mutex while sleeping, so later arrivals queue
//! behind it.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Rate limiter configuration.
///
/// Capacity and refill rate should match the broker's published quota
/// (Alpaca: 200 requests/minute on the standard tier).
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of tokens the bucket holds.
    pub capacity: u32,
    /// Tokens added per second.
    pub refill_per_sec: f64,
    /// Default timeout for `acquire`.
    pub acquire_timeout: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            capacity: 200,
            refill_per_sec: 200.0 / 60.0,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// Rate limiter errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RateLimitError {
    /// No token became available within the caller's timeout.
    #[error("Timed out waiting for a rate limiter permit")]
    Timeout,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant, capacity: f64, refill_per_sec: f64) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_per_sec).min(capacity);
        self.last_refill = now;
    }
}

/// Shared token-bucket gate in front of the broker client.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    // tokio's Mutex queues waiters fairly, which gives FIFO permit order.
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a new rate limiter with a full bucket.
    #[must_use]
    pub fn new(config: RateLimiterConfig) -> Self {
        let bucket = Bucket {
            tokens: f64::from(config.capacity),
            last_refill: Instant::now(),
        };
        Self {
            config,
            bucket: Mutex::new(bucket),
        }
    }

    /// Acquire one permit, waiting up to the configured default timeout.
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError::Timeout` if no permit became available.
    pub async fn acquire(&self) -> Result<(), RateLimitError> {
        self.acquire_with_timeout(self.config.acquire_timeout).await
    }

    /// Acquire one permit, waiting up to `timeout`.
    ///
    /// Waits cooperatively (no busy-waiting). On timeout no token is
    /// consumed.
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError::Timeout` if no permit became available.
    pub async fn acquire_with_timeout(&self, timeout: Duration) -> Result<(), RateLimitError> {
        let deadline = Instant::now() + timeout;

        let mut bucket = match tokio::time::timeout_at(deadline, self.bucket.lock()).await {
            Ok(guard) => guard,
            Err(_) => return Err(RateLimitError::Timeout),
        };

        let capacity = f64::from(self.config.capacity);
        let rate = self.config.refill_per_sec;

        bucket.refill(Instant::now(), capacity, rate);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return Ok(());
        }

        let deficit = 1.0 - bucket.tokens;
        let wait = Duration::from_secs_f64(deficit / rate);
        if Instant::now() + wait > deadline {
            return Err(RateLimitError::Timeout);
        }

        // Sleep while holding the lock: arrivals behind us stay queued,
        // preserving FIFO order.
        tokio::time::sleep(wait).await;

        bucket.refill(Instant::now(), capacity, rate);
        bucket.tokens = (bucket.tokens - 1.0).max(0.0);
        Ok(())
    }
}
