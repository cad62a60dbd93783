//! The per-error-kind retry policy table (spec.md §3 "Retry policy entry",
//! §4.3). Grounded on `RetryPolicy`/`RetryPolicyBuilder` (ninelives
//! `src/retry.rs`), generalized from ninelives' single `max_attempts`/
//! `Backoff` pair to a table keyed by [`ErrorKind`] with the `-1` retries
//! and delay_cap sentinels the original Python config format uses.

use crate::backoff::{retry_wait, RetryType};
use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// One row of the policy table. Missing fields take the defaults listed in
/// spec.md §3: `retries = 0`, `retry_delay = 0`, `retry_type = "linear"`,
/// `delay_cap = -1` (uncapped).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicyEntry {
    /// `-1` means retry forever.
    pub retries: i64,
    pub retry_delay_secs: f64,
    #[serde(deserialize_with = "deserialize_retry_type", default)]
    pub retry_type: RetryTypeConfig,
    /// `-1` means no cap.
    pub delay_cap_secs: f64,
}

impl Default for RetryPolicyEntry {
    fn default() -> Self {
        Self { retries: 0, retry_delay_secs: 0.0, retry_type: RetryTypeConfig::Linear, delay_cap_secs: -1.0 }
    }
}

/// Serde-friendly mirror of [`RetryType`] (so unrecognised strings
/// deserialize instead of erroring, matching the "unrecognised kind falls
/// back to linear" dispatch rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RetryTypeConfig {
    #[default]
    Linear,
    IncrementalBackOff,
}

fn deserialize_retry_type<'de, D>(deserializer: D) -> Result<RetryTypeConfig, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(match RetryType::parse(&raw) {
        RetryType::Linear => RetryTypeConfig::Linear,
        RetryType::IncrementalBackOff => RetryTypeConfig::IncrementalBackOff,
    })
}

impl RetryPolicyEntry {
    pub fn max_retries(&self) -> Option<u32> {
        if self.retries < 0 {
            None
        } else {
            Some(self.retries as u32)
        }
    }

    pub fn delay_cap(&self) -> Option<Duration> {
        if self.delay_cap_secs < 0.0 {
            None
        } else {
            Some(Duration::from_secs_f64(self.delay_cap_secs))
        }
    }

    pub fn retry_type(&self) -> RetryType {
        match self.retry_type {
            RetryTypeConfig::Linear => RetryType::Linear,
            RetryTypeConfig::IncrementalBackOff => RetryType::IncrementalBackOff,
        }
    }

    pub fn sleep_time(&self, attempt: u32) -> Duration {
        retry_wait(
            self.retry_type(),
            Duration::from_secs_f64(self.retry_delay_secs),
            self.delay_cap(),
            attempt,
        )
    }
}

/// The per-provider mapping from error kind to [`RetryPolicyEntry`]. Kinds
/// absent from the table fall back to `RetryPolicyEntry::default()`
/// (`retries = 0`): a provider that doesn't configure `content_malformed`
/// gets the "typically 0 retries" behaviour spec.md §7 describes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyTable {
    #[serde(flatten)]
    entries: HashMap<String, RetryPolicyEntry>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, kind: ErrorKind, entry: RetryPolicyEntry) {
        self.entries.insert(kind.as_str().to_string(), entry);
    }

    fn entry(&self, kind: ErrorKind) -> RetryPolicyEntry {
        self.entries.get(kind.as_str()).cloned().unwrap_or_default()
    }

    pub fn get_max_retries(&self, kind: ErrorKind) -> Option<u32> {
        self.entry(kind).max_retries()
    }

    pub fn get_sleep_time(&self, kind: ErrorKind, attempt: u32) -> Duration {
        self.entry(kind).sleep_time(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S3 — retry exhaustion: policy {retries:3, retry_delay:0.1, linear}
    #[test]
    fn exhaustion_policy_allows_exactly_three_retries() {
        let mut table = PolicyTable::new();
        table.set(
            ErrorKind::HttpTimeout,
            RetryPolicyEntry { retries: 3, retry_delay_secs: 0.1, ..Default::default() },
        );
        assert_eq!(table.get_max_retries(ErrorKind::HttpTimeout), Some(3));
        assert_eq!(table.get_sleep_time(ErrorKind::HttpTimeout, 1), Duration::from_millis(100));
    }

    // S4 — no-retry policy.
    #[test]
    fn default_policy_has_zero_retries() {
        let table = PolicyTable::new();
        assert_eq!(table.get_max_retries(ErrorKind::ContentMalformed), Some(0));
    }

    #[test]
    fn negative_one_retries_means_unbounded() {
        let mut table = PolicyTable::new();
        table.set(
            ErrorKind::RateLimitReached,
            RetryPolicyEntry { retries: -1, ..Default::default() },
        );
        assert_eq!(table.get_max_retries(ErrorKind::RateLimitReached), None);
    }

    #[test]
    fn negative_delay_cap_is_uncapped() {
        let entry = RetryPolicyEntry::default();
        assert_eq!(entry.delay_cap(), None);
    }

    #[test]
    fn deserializes_from_toml_style_map() {
        let toml_src = r#"
            [http_timeout]
            retries = 5
            retry_delay_secs = 1.0
            retry_type = "incremental_back_off"
            delay_cap_secs = 60.0
        "#;
        let table: PolicyTable = toml::from_str(toml_src).unwrap();
        assert_eq!(table.get_max_retries(ErrorKind::HttpTimeout), Some(5));
        assert_eq!(table.get_sleep_time(ErrorKind::HttpTimeout, 3), Duration::from_secs(4));
    }
}
