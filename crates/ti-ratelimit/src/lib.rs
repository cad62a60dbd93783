//! The per-provider rate-limit state machine (spec.md §4.1, §3 "Rate-limit
//! invariants"). Grounded on `botticelli_rate_limit`'s split between static
//! config (`RateLimitConfig`) and mutable detector/limiter state, with the
//! exact pacing formula taken from spec.md §4.1.

use std::sync::Mutex;
use std::time::Duration;
use ti_core::{Clock, MonotonicClock};

/// Static, per-provider rate-limit parameters (spec.md §3 "Provider").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RateLimitConfig {
    pub rate_period_secs: u64,
    pub rate_limit: u32,
    #[serde(default)]
    pub throttled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { rate_period_secs: 0, rate_limit: 0, throttled: false }
    }
}

#[derive(Debug)]
struct WindowState {
    /// Window start, in clock milliseconds. `None` until the first hit.
    time_fixture_ms: Option<u64>,
    last_request_time_ms: Option<u64>,
    request_count: u32,
}

/// Mutable rate-limit state for one provider. Owned by the provider entry
/// and updated under its own lock (spec.md §5: "that sub-state is updated
/// under the provider's own lock"), so both AliasThread and MetricsThread
/// workers calling the same provider observe a single, consistent window.
#[derive(Debug)]
pub struct RateLimitState {
    config: RateLimitConfig,
    clock: Box<dyn Clock>,
    window: Mutex<WindowState>,
    /// `rate_limit + 1`: a deliberate one-hit safety margin (spec.md §4.1
    /// note, Open Question 1 — see DESIGN.md for why we keep it rather than
    /// treat it as a bug).
    effective_limit: u32,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Box::new(MonotonicClock::default()))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Box<dyn Clock>) -> Self {
        let effective_limit = config.rate_limit.saturating_add(1);
        Self {
            config,
            clock,
            window: Mutex::new(WindowState {
                time_fixture_ms: None,
                last_request_time_ms: None,
                request_count: 0,
            }),
            effective_limit,
        }
    }

    fn rate_period_ms(&self) -> u64 {
        self.config.rate_period_secs * 1000
    }

    /// How long the caller should pace itself before issuing the next
    /// request against this provider. Never exceeds `rate_period_secs`
    /// (spec.md §8 Invariant 4).
    pub fn sleep_time(&self) -> Duration {
        if !self.config.throttled {
            return Duration::ZERO;
        }

        let now_ms = self.clock.now_millis();
        let window = self.window.lock().expect("RateLimitState: mutex poisoned");

        let time_fixture_ms = match window.time_fixture_ms {
            Some(ms) => ms,
            // No hits yet: nothing to pace against.
            None => return Duration::ZERO,
        };

        let window_end = time_fixture_ms + self.rate_period_ms();
        if now_ms >= window_end {
            // Window has expired; the next register_unthrottled_hit() will
            // reset it. Nothing to pace against right now.
            return Duration::ZERO;
        }

        let remaining_requests =
            (self.effective_limit as i64 - window.request_count as i64).max(1) as u64;
        let remaining_ms = window_end.saturating_sub(now_ms);
        Duration::from_millis(remaining_ms / remaining_requests)
    }

    /// Record a request that was allowed through. Resets the window if it
    /// has expired, otherwise increments the in-window count and stamps
    /// `last_request_time`.
    pub fn register_unthrottled_hit(&self) {
        let now_ms = self.clock.now_millis();
        let mut window = self.window.lock().expect("RateLimitState: mutex poisoned");

        let window_expired = match window.time_fixture_ms {
            None => true,
            Some(fixture) => now_ms >= fixture + self.rate_period_ms(),
        };

        if window_expired {
            tracing::debug!(rate_period_secs = self.config.rate_period_secs, "rate-limit window reset");
            window.time_fixture_ms = Some(now_ms);
            window.request_count = 0;
        }

        window.request_count += 1;
        window.last_request_time_ms = Some(now_ms);

        debug_assert!(window.request_count <= self.effective_limit + 1);
    }

    pub fn request_count(&self) -> u32 {
        self.window.lock().expect("RateLimitState: mutex poisoned").request_count
    }
}
