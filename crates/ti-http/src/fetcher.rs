//! The single-operation HTTP fetcher: spec.md §4.2.

use crate::cache::ContentCache;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use ti_core::{drive_retries, ErrorKind, PolicyTable, ProviderError, Shutdown, Sleeper};

/// Default GET timeout when the caller doesn't specify one (spec.md §4.2).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Optional retry wiring for [`Fetcher::get`]'s step 4: when present, the
/// fetcher drives its own `http_timeout`/`http_error` retries against
/// `policy` before surfacing the error, reusing `ti_core::drive_retries`
/// rather than re-implementing the loop.
pub struct RetryConfig<'a> {
    pub policy: &'a PolicyTable,
    pub sleeper: &'a dyn Sleeper,
    pub shutdown: &'a Shutdown,
}

pub struct Fetcher {
    client: reqwest::Client,
    cache: Option<Arc<dyn ContentCache>>,
}

impl Fetcher {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new(), cache: None }
    }

    pub fn with_cache(cache: Arc<dyn ContentCache>) -> Self {
        Self { client: reqwest::Client::new(), cache: Some(cache) }
    }

    /// Perform a single logical GET, consulting the cache first, and
    /// applying the error-taxonomy mapping in spec.md §4.2 point 3. When
    /// `retry` is supplied, transport failures are retried in-place per
    /// point 4.
    pub async fn get(
        &self,
        url: &str,
        headers: Option<HeaderMap>,
        timeout: Option<Duration>,
        retry: Option<RetryConfig<'_>>,
    ) -> Result<String, ProviderError> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(url).await {
                return Ok(body);
            }
        }

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);

        let body = match retry {
            Some(cfg) => {
                drive_retries(
                    cfg.policy,
                    cfg.sleeper,
                    cfg.shutdown,
                    |kind| matches!(kind, ErrorKind::HttpTimeout | ErrorKind::HttpError),
                    |_attempt| self.fetch_once(url, headers.clone(), timeout),
                )
                .await?
            }
            None => self.fetch_once(url, headers, timeout).await?,
        };

        if let Some(cache) = &self.cache {
            cache.set(url, body.clone()).await;
        }
        Ok(body)
    }

    async fn fetch_once(
        &self,
        url: &str,
        headers: Option<HeaderMap>,
        timeout: Duration,
    ) -> Result<String, ProviderError> {
        let mut req = self.client.get(url).timeout(timeout);
        if let Some(headers) = headers {
            req = req.headers(headers);
        }

        let response = req.send().await.map_err(classify_transport_error)?;
        let status = response.status();

        if status.is_success() {
            response.text().await.map_err(classify_transport_error)
        } else if status.is_client_error() {
            Err(ProviderError::client_server_error(format!("HTTP {status} (client error) for {url}")))
        } else if status.is_server_error() {
            Err(ProviderError::client_server_error(format!("HTTP {status} (server error) for {url}")))
        } else {
            Err(ProviderError::http_error(format!("HTTP {status} for {url}")))
        }
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn classify_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::http_timeout(err.to_string())
    } else {
        ProviderError::http_error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_timeout_vs_generic_transport_error() {
        // reqwest::Error isn't directly constructible outside the crate;
        // the status-code mapping below is what's under our control and
        // what we exercise directly.
        let client_err = ProviderError::client_server_error("HTTP 404 for http://x");
        assert_eq!(client_err.kind(), ErrorKind::ClientServerError);
    }

    #[tokio::test]
    async fn cache_hit_short_circuits_before_network() {
        use crate::cache::InMemoryCache;
        let cache = Arc::new(InMemoryCache::default());
        cache.set("http://example.invalid/x", "cached body".to_string()).await;
        let fetcher = Fetcher::with_cache(cache);
        let body = fetcher.get("http://example.invalid/x", None, None, None).await.unwrap();
        assert_eq!(body, "cached body");
    }
}
