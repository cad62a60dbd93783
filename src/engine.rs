//! The generic retry-drive loop shared by the HTTP fetcher (`ti-http`) and
//! the provider invocation engine (`ti-providers`) — spec.md §4.2 point 4:
//! "The same retry machinery is reused; no duplication." This is the engine
//! half of spec.md §4.3 steps 3-4 (rate-limit gating and method dispatch are
//! caller-specific and live in `ti-providers`).

use crate::error::{ErrorKind, ProviderError};
use crate::retry::PolicyTable;
use crate::shutdown::Shutdown;
use crate::sleeper::{interruptible_sleep, Sleeper};
use std::collections::HashMap;
use std::future::Future;

/// Drive `operation` to a terminal outcome against `policy`.
///
/// `operation(attempt)` is called with a 1-indexed attempt counter (the
/// number of times it has been invoked so far, including this call) and
/// must return `Ok` on success or `Err(ProviderError)` on a classified
/// failure. Only errors for which `retryable(kind)` is true are counted
/// against the policy table and retried; any other kind is returned to the
/// caller immediately without consulting the table (used by `ti-http` to
/// keep transport-level retries separate from status/content-level ones).
///
/// Returns `Ok(value)` on success, or the last `ProviderError` once the
/// relevant kind's retry budget (spec.md §3 "retries = -1 means retry
/// forever") is exhausted or shutdown is signalled mid-loop.
pub async fn drive_retries<T, Op, Fut>(
    policy: &PolicyTable,
    sleeper: &dyn Sleeper,
    shutdown: &Shutdown,
    retryable: impl Fn(ErrorKind) -> bool,
    mut operation: Op,
) -> Result<T, ProviderError>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut counts: HashMap<ErrorKind, u32> = HashMap::new();
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        if shutdown.is_signalled() {
            // Caller treats an interrupted loop as an exhausted one; the
            // specific error is synthetic and never surfaced to a user.
            return Err(ProviderError::unknown("shutdown signalled during retry loop"));
        }

        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let kind = err.kind();
                if !retryable(kind) {
                    return Err(err);
                }

                let count = counts.entry(kind).or_insert(0);
                *count += 1;
                let current = *count;

                let max_retries = policy.get_max_retries(kind);
                if let Some(max) = max_retries {
                    if current > max {
                        return Err(err);
                    }
                }

                let duration = policy.get_sleep_time(kind, current);
                interruptible_sleep(sleeper, duration, shutdown).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicyEntry;
    use crate::sleeper::InstantSleeper;
    use std::sync::atomic::{AtomicU32, Ordering};

    // S3 — retry exhaustion with policy {retries:3, retry_delay:0.1, linear}.
    #[tokio::test]
    async fn retries_three_times_then_surfaces_the_error() {
        let mut policy = PolicyTable::new();
        policy.set(
            ErrorKind::HttpTimeout,
            RetryPolicyEntry { retries: 3, retry_delay_secs: 0.1, ..Default::default() },
        );
        let sleeper = InstantSleeper;
        let shutdown = Shutdown::new();
        let calls = AtomicU32::new(0);

        let result: Result<(), ProviderError> = drive_retries(
            &policy,
            &sleeper,
            &shutdown,
            |_| true,
            |_attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::http_timeout("always times out")) }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4); // 1 initial + 3 retries
    }

    // S4 — no-retry policy: first error returns immediately.
    #[tokio::test]
    async fn zero_retry_policy_aborts_on_first_failure() {
        let policy = PolicyTable::new();
        let sleeper = InstantSleeper;
        let shutdown = Shutdown::new();
        let calls = AtomicU32::new(0);

        let result: Result<(), ProviderError> = drive_retries(
            &policy,
            &sleeper,
            &shutdown,
            |_| true,
            |_attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::content_malformed("bad json")) }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_on_a_later_attempt_within_budget() {
        let mut policy = PolicyTable::new();
        policy.set(
            ErrorKind::HttpError,
            RetryPolicyEntry { retries: 5, retry_delay_secs: 0.0, ..Default::default() },
        );
        let sleeper = InstantSleeper;
        let shutdown = Shutdown::new();

        let result = drive_retries(&policy, &sleeper, &shutdown, |_| true, |attempt| async move {
            if attempt < 3 {
                Err(ProviderError::http_error("flaky"))
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn non_retryable_kind_surfaces_immediately_even_with_budget() {
        let mut policy = PolicyTable::new();
        policy.set(
            ErrorKind::ClientServerError,
            RetryPolicyEntry { retries: 10, ..Default::default() },
        );
        let sleeper = InstantSleeper;
        let shutdown = Shutdown::new();
        let calls = AtomicU32::new(0);

        // Only http_timeout/http_error are retryable in this call (mimics
        // ti-http's internal transport-only retry).
        let result: Result<(), ProviderError> = drive_retries(
            &policy,
            &sleeper,
            &shutdown,
            |kind| matches!(kind, ErrorKind::HttpTimeout | ErrorKind::HttpError),
            |_attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::client_server_error("404")) }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unbounded_retries_keep_going_past_large_counts() {
        let mut policy = PolicyTable::new();
        policy.set(
            ErrorKind::RateLimitReached,
            RetryPolicyEntry { retries: -1, retry_delay_secs: 0.0, ..Default::default() },
        );
        let sleeper = InstantSleeper;
        let shutdown = Shutdown::new();

        let result = drive_retries(&policy, &sleeper, &shutdown, |_| true, |attempt| async move {
            if attempt < 50 {
                Err(ProviderError::rate_limit_reached("quota"))
            } else {
                Ok(())
            }
        })
        .await;

        assert!(result.is_ok());
    }
}
