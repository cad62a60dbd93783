//! The provider invocation engine (spec.md §4.3, component C3). Dispatches
//! one `(provider, method, alias)` call: checks capability and relevance,
//! paces itself against the provider's rate limiter, then drives the
//! fetch-and-extract step through `ti_core::drive_retries` — the same
//! retry machinery `ti-http` uses for its own transport-level retries, per
//! spec.md §4.2 point 4 ("no duplication").

use crate::descriptor::ProviderSpec;
use crate::extractors::Method;
use std::collections::HashMap;
use std::time::Duration;
use ti_core::{drive_retries, Alias, ErrorKind, ProviderError, Shutdown, Sleeper};
use ti_http::Fetcher;

/// The tagged result of one provider method call (REDESIGN FLAGS: "tagged
/// variant: AliasList | BiblioMap | MetricMap" in place of the Python
/// source's untyped dict-or-list return).
#[derive(Debug, Clone)]
pub enum Response {
    AliasList(Vec<Alias>),
    BiblioMap(HashMap<String, serde_json::Value>),
    MetricMap(HashMap<String, f64>),
}

/// Invoke `method` on `spec` against `item_aliases` — the item's full alias
/// set, already filtered by the caller to `provider.namespaces_for(method)`
/// per spec.md §4.3 step 2. Returns `Ok(Response::*(empty))` without making
/// a network call when `spec` doesn't support `method` or none of
/// `item_aliases` is relevant to it; otherwise paces against the rate
/// limiter, fetches (using the first relevant alias to build the URL),
/// extracts, and retries per the provider's policy table.
pub async fn invoke(
    spec: &ProviderSpec,
    method: Method,
    item_aliases: &[Alias],
    fetcher: &Fetcher,
    sleeper: &dyn Sleeper,
    shutdown: &Shutdown,
) -> Result<Response, ProviderError> {
    let relevant: Vec<Alias> = item_aliases.iter().filter(|a| spec.is_relevant_alias(a)).cloned().collect();

    if !spec.provides(method) || relevant.is_empty() {
        return Ok(empty_response(method));
    }

    let url = spec.extractor().build_url(&spec.template_for(method), &relevant[0]);
    let timeout = Duration::from_secs(spec.timeout_secs());
    let policy = spec.policy();
    let rate_limit = spec.rate_limit();

    let response = drive_retries(
        policy,
        sleeper,
        shutdown,
        |kind| ErrorKind::RETRYABLE.contains(&kind),
        |_attempt| async {
            ti_core::interruptible_sleep(sleeper, rate_limit.sleep_time(), shutdown).await;

            let body = fetcher.get(&url, None, Some(timeout), None).await?;
            rate_limit.register_unthrottled_hit();

            extract(spec, method, &relevant, &url, &body).await
        },
    )
    .await?;

    Ok(response)
}

async fn extract(
    spec: &ProviderSpec,
    method: Method,
    aliases: &[Alias],
    url: &str,
    body: &str,
) -> Result<Response, ProviderError> {
    let extractor = spec.extractor();
    match method {
        Method::Aliases => Ok(Response::AliasList(extractor.aliases(aliases, url, body).await?)),
        Method::Biblio => Ok(Response::BiblioMap(extractor.biblio(aliases, url, body).await?)),
        Method::Metrics => Ok(Response::MetricMap(extractor.metrics(aliases, url, body).await?)),
    }
}

fn empty_response(method: Method) -> Response {
    match method {
        Method::Aliases => Response::AliasList(Vec::new()),
        Method::Biblio => Response::BiblioMap(HashMap::new()),
        Method::Metrics => Response::MetricMap(HashMap::new()),
    }
}
