//! Token-bucket rate limiter.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::config::TOKEN_RETRY_INTERVAL;
use crate::error_handling::ConfigError;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket rate limiter for controlling request rate.
///
/// Tokens accumulate at `rate` per second up to `capacity` and one token is
/// consumed per permitted request. Refill is computed lazily from elapsed
/// wall-clock time at each acquisition attempt; there is no background
/// replenishment task. The bucket starts full, so up to `capacity` requests
/// can burst immediately.
///
/// # Behavior
///
/// - `acquire()` suspends until a token is available, sleeping a fixed short
///   interval between attempts, with no upper bound on the wait
/// - Refill is only committed once at least one whole token has accumulated,
///   so fractional progress is never lost to clamping
/// - The internal lock is never held across a suspension point; cancelling a
///   waiting caller leaves the book-keeping intact, and a token already
///   taken is not returned
pub struct TokenBucket {
    state: Mutex<BucketState>,
    capacity: f64,
    rate: f64,
}

impl TokenBucket {
    /// Creates a bucket with the given refill rate (tokens per second) and
    /// capacity.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `rate` is not positive or `capacity` is
    /// below one token; either would make `acquire()` wait forever.
    pub fn new(rate: f64, capacity: f64) -> Result<Self, ConfigError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::InvalidRate(rate));
        }
        if !capacity.is_finite() || capacity < 1.0 {
            return Err(ConfigError::InvalidCapacity(capacity));
        }
        Ok(TokenBucket {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            rate,
        })
    }

    /// Suspends the caller until a token is available, then takes it.
    pub async fn acquire(&self) {
        loop {
            {
                let mut state = self.state.lock().await;
                let elapsed = state.last_refill.elapsed().as_secs_f64();
                let refilled = elapsed * self.rate;
                if state.tokens + refilled >= 1.0 {
                    state.tokens = (state.tokens + refilled).min(self.capacity);
                    state.last_refill = Instant::now();
                }
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    log::trace!("token taken, {:.2} left", state.tokens);
                    return;
                }
            }
            sleep(TOKEN_RETRY_INTERVAL).await;
        }
    }

    /// Tokens currently available, after applying any pending refill.
    ///
    /// Useful for monitoring and tests; the value may be stale by the time
    /// the caller reads it.
    pub async fn available(&self) -> f64 {
        let state = self.state.lock().await;
        let refilled = state.last_refill.elapsed().as_secs_f64() * self.rate;
        (state.tokens + refilled).min(self.capacity)
    }

    /// Bucket capacity.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }
}

impl std::fmt::Debug for TokenBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucket")
            .field("capacity", &self.capacity)
            .field("rate", &self.rate)
            .finish()
    }
}
