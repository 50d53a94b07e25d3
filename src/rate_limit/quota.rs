//! Server-advertised quota gate.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::config::{
    QuotaSettings, QUOTA_LOW_WATER, QUOTA_MIN_WAIT, QUOTA_REMAINING_HEADER, QUOTA_RESET_HEADER,
};
use crate::error_handling::ConfigError;

struct QuotaState {
    remaining: u32,
    reset_after: Duration,
    last_updated: Instant,
}

/// Gate over a server-advertised request quota.
///
/// Tracks the remaining-request count and reset window the server reports in
/// its response headers. Before a network call, `acquire()` blocks while the
/// count sits below the low-water mark, sleeping half the reset window per
/// cycle; once a full window has elapsed since the last update the count is
/// treated as replenished to the configured ceiling.
///
/// `observe()` is the only external mutation point: after every response the
/// resolver feeds the advertised values back in, overwriting the tracked
/// state. If the server never reports quota metadata the gate runs on its
/// seeded defaults, draining by one per passage, so a silent server
/// converges to throttling rather than to an uncontrolled send rate.
pub struct QuotaGate {
    state: Mutex<QuotaState>,
    ceiling: u32,
    low_water: u32,
}

impl QuotaGate {
    /// Creates a gate from seed values and a replenish ceiling.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the ceiling is below the low-water mark:
    /// the first replenish would leave the gate blocked forever.
    pub fn new(settings: &QuotaSettings) -> Result<Self, ConfigError> {
        if settings.ceiling < QUOTA_LOW_WATER {
            return Err(ConfigError::QuotaCeilingTooLow {
                ceiling: settings.ceiling,
                low_water: QUOTA_LOW_WATER,
            });
        }
        Ok(QuotaGate {
            state: Mutex::new(QuotaState {
                remaining: settings.seed_remaining,
                reset_after: settings.seed_reset,
                last_updated: Instant::now(),
            }),
            ceiling: settings.ceiling,
            low_water: QUOTA_LOW_WATER,
        })
    }

    /// Suspends the caller until quota is available, then drains one unit.
    ///
    /// Returns `true` if the caller had to wait at least one cycle.
    pub async fn acquire(&self) -> bool {
        let mut waited = false;
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                if state.remaining >= self.low_water {
                    state.remaining -= 1;
                    return waited;
                }
                if state.last_updated.elapsed() >= state.reset_after {
                    // Window elapsed with no fresher server data; treat the
                    // quota as replenished
                    log::debug!(
                        "quota window elapsed, replenishing {} -> {}",
                        state.remaining,
                        self.ceiling
                    );
                    state.remaining = self.ceiling - 1;
                    state.last_updated = Instant::now();
                    return waited;
                }
                (state.reset_after / 2).max(QUOTA_MIN_WAIT)
            };
            log::debug!("quota below low-water mark, waiting {:?}", wait);
            waited = true;
            sleep(wait).await;
        }
    }

    /// Overwrites the tracked quota from a response's advertised values.
    pub async fn observe(&self, remaining: u32, reset_after: Duration) {
        let mut state = self.state.lock().await;
        state.remaining = remaining;
        state.reset_after = reset_after;
        state.last_updated = Instant::now();
        log::trace!(
            "quota observed: {} remaining, resets in {:?}",
            remaining,
            reset_after
        );
    }

    /// Remaining-request count as last tracked.
    ///
    /// Monitoring accessor; the value may be stale by the time it is read.
    pub async fn remaining(&self) -> u32 {
        self.state.lock().await.remaining
    }
}

impl std::fmt::Debug for QuotaGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaGate")
            .field("ceiling", &self.ceiling)
            .field("low_water", &self.low_water)
            .finish()
    }
}

/// Extracts advertised quota values from a response header map.
///
/// Returns the remaining-request count and reset window when the server
/// reported both; `None` leaves the gate on its previous state.
pub fn quota_from_headers(headers: &HashMap<String, String>) -> Option<(u32, Duration)> {
    let remaining = headers.get(QUOTA_REMAINING_HEADER)?.trim().parse().ok()?;
    let reset_secs: u64 = headers.get(QUOTA_RESET_HEADER)?.trim().parse().ok()?;
    Some((remaining, Duration::from_secs(reset_secs)))
}
