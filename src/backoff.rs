//! Delay formulas for the retry policy table: `linear` and
//! `incremental_back_off`, plus the dispatch that picks one by
//! [`RetryType`]. Grounded on `Backoff::delay` (ninelives `src/backoff.rs`),
//! generalized to the sentinel-cap semantics spec.md §4.3 requires: a
//! `delay_cap` of `-1` means "uncapped", not "cap of minus one second".

use std::time::Duration;

/// How a provider's policy-table entry grows its retry delay across
/// attempts. Any string the config layer doesn't recognise falls back to
/// `Linear` (spec.md §4.3 "Dispatch").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryType {
    #[default]
    Linear,
    IncrementalBackOff,
}

impl RetryType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "incremental_back_off" => RetryType::IncrementalBackOff,
            _ => RetryType::Linear,
        }
    }
}

/// `retry_delay` capped by `delay_cap`, or uncapped when `delay_cap` is
/// `None` (the `-1` sentinel). The attempt number is ignored: linear delay
/// never grows.
pub fn linear_delay(retry_delay: Duration, delay_cap: Option<Duration>) -> Duration {
    match delay_cap {
        Some(cap) => retry_delay.min(cap),
        None => retry_delay,
    }
}

/// `retry_delay * 2^(attempt-1)`, capped by `delay_cap` when present.
/// `attempt` is 1-indexed: the first retry (`attempt == 1`) yields exactly
/// `retry_delay`.
pub fn incremental_back_off(
    retry_delay: Duration,
    delay_cap: Option<Duration>,
    attempt: u32,
) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let multiplier = 2u32.checked_pow(exponent).unwrap_or(u32::MAX);
    let candidate =
        retry_delay.checked_mul(multiplier).unwrap_or(Duration::from_secs(u64::MAX / 2));
    match delay_cap {
        Some(cap) => candidate.min(cap),
        None => candidate,
    }
}

/// Selects the delay formula for `retry_type` and evaluates it.
pub fn retry_wait(
    retry_type: RetryType,
    retry_delay: Duration,
    delay_cap: Option<Duration>,
    attempt: u32,
) -> Duration {
    match retry_type {
        RetryType::Linear => linear_delay(retry_delay, delay_cap),
        RetryType::IncrementalBackOff => incremental_back_off(retry_delay, delay_cap, attempt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S1 — Linear delay capped.
    #[test]
    fn linear_delay_is_capped() {
        assert_eq!(
            linear_delay(Duration::from_secs(10), Some(Duration::from_secs(5))),
            Duration::from_secs(5)
        );
        assert_eq!(linear_delay(Duration::from_secs(1), Some(Duration::from_secs(10))), Duration::from_secs(1));
        assert_eq!(linear_delay(Duration::from_secs(1), None), Duration::from_secs(1));
    }

    // S2 — Exponential growth for attempts 1..9 with delay=2s, cap huge.
    #[test]
    fn incremental_back_off_doubles_each_attempt() {
        let expect = [2u64, 4, 8, 16, 32, 64, 128, 256, 512];
        for (i, &secs) in expect.iter().enumerate() {
            let attempt = (i + 1) as u32;
            let got = incremental_back_off(
                Duration::from_secs(2),
                Some(Duration::from_secs(1_000_000)),
                attempt,
            );
            assert_eq!(got, Duration::from_secs(secs), "attempt {attempt}");
        }
    }

    #[test]
    fn incremental_back_off_respects_cap() {
        let d = incremental_back_off(
            Duration::from_millis(100),
            Some(Duration::from_secs(1)),
            10,
        );
        assert_eq!(d, Duration::from_secs(1));
    }

    #[test]
    fn incremental_back_off_uncapped_grows_unbounded() {
        let d = incremental_back_off(Duration::from_millis(100), None, 20);
        assert!(d > Duration::from_secs(1_000));
    }

    #[test]
    fn dispatch_unknown_type_falls_back_to_linear() {
        assert_eq!(RetryType::parse("nonsense"), RetryType::Linear);
        assert_eq!(RetryType::parse("linear"), RetryType::Linear);
        assert_eq!(RetryType::parse("incremental_back_off"), RetryType::IncrementalBackOff);
    }

    #[test]
    fn retry_wait_dispatches_by_type() {
        let linear = retry_wait(RetryType::Linear, Duration::from_secs(3), None, 5);
        assert_eq!(linear, Duration::from_secs(3));

        let exp = retry_wait(RetryType::IncrementalBackOff, Duration::from_secs(1), None, 3);
        assert_eq!(exp, Duration::from_secs(4));
    }
}
