//! The Backend Supervisor (spec.md §4.5, component C5): spawns one
//! AliasThread-equivalent task per configured alias worker slot, plus one
//! MetricsThread-equivalent task per `(provider, worker slot)`, installs
//! signal handlers, and shuts everything down cooperatively. Grounded on
//! `TotalImpactBackend._spawn_threads`/`_monitor`/`_cleanup` and
//! `ProvidersAliasThread.process_item`/`ProviderMetricsThread.process_item`
//! in `original_source/totalimpact/backend.py`; tokio tasks replace OS
//! threads per the scheduling-model note in spec.md §5.

use crate::journal::Journal;
use std::sync::Arc;
use std::time::Duration;
use ti_core::{Item, Shutdown, Sleeper, TokioSleeper};
use ti_http::Fetcher;
use ti_providers::{invoke, Method, ProviderRegistry, Response};
use ti_queue::{dequeue_blocking, Queue};

/// Everything a worker task needs, shared read-only across all workers.
pub struct WorkerContext {
    pub registry: Arc<ProviderRegistry>,
    pub fetcher: Arc<Fetcher>,
    pub journal: Arc<Journal>,
    pub shutdown: Shutdown,
}

/// Spawn `workers` AliasThread-equivalent tasks bound to `alias_queue`, and
/// one MetricsThread-equivalent task per `(provider, worker slot)` bound to
/// the matching entry in `metrics_queues`. Returns the join handles so the
/// caller can await orderly shutdown.
pub fn spawn_workers(
    ctx: Arc<WorkerContext>,
    alias_workers: u32,
    alias_queue: Arc<dyn Queue>,
    metrics_queues: Vec<(String, u32, Arc<dyn Queue>)>,
) -> Vec<tokio::task::JoinHandle<()>> {
    let mut handles = Vec::new();

    for worker_id in 0..alias_workers {
        let ctx = ctx.clone();
        let queue = alias_queue.clone();
        handles.push(tokio::spawn(async move {
            tracing::info!(worker_id, "alias worker started");
            alias_worker_loop(ctx, queue.as_ref()).await;
            tracing::info!(worker_id, "alias worker stopped");
        }));
    }

    for (provider_name, workers, queue) in metrics_queues {
        for worker_id in 0..workers {
            let ctx = ctx.clone();
            let queue = queue.clone();
            let provider_name = provider_name.clone();
            handles.push(tokio::spawn(async move {
                tracing::info!(provider = %provider_name, worker_id, "metrics worker started");
                metrics_worker_loop(ctx, queue.as_ref(), &provider_name).await;
                tracing::info!(provider = %provider_name, worker_id, "metrics worker stopped");
            }));
        }
    }

    handles
}

/// One AliasThread's `process_item`: walk all providers in order, running
/// `aliases` then `biblio` for each (spec.md §4.5).
async fn alias_worker_loop(ctx: Arc<WorkerContext>, queue: &dyn Queue) {
    let sleeper = TokioSleeper;
    while let Some(mut item) = dequeue_blocking(queue, &sleeper, &ctx.shutdown).await {
        process_alias_item(&ctx, &mut item, &sleeper).await;
        queue.save_and_unqueue(item);
    }
}

async fn process_alias_item(ctx: &WorkerContext, item: &mut Item, sleeper: &dyn Sleeper) {
    for provider in ctx.registry.in_order() {
        let alias_seeds = item.aliases.get(provider.namespaces_for(Method::Aliases));
        match invoke(&provider, Method::Aliases, &alias_seeds, &ctx.fetcher, sleeper, &ctx.shutdown).await {
            Ok(Response::AliasList(new_aliases)) => {
                item.aliases.add_unique(new_aliases);
            }
            Ok(_) => unreachable!("Method::Aliases always yields Response::AliasList"),
            Err(err) => {
                ctx.journal.record(item.id(), provider.name(), "aliases", &err).await;
                // Terminal failure: wipe aliases before save, abandon this
                // item for every remaining provider (spec.md §4.5 "no
                // results rather than incorrect results").
                item.aliases.clear();
                return;
            }
        }

        let biblio_seeds = item.aliases.get(provider.namespaces_for(Method::Biblio));
        match invoke(&provider, Method::Biblio, &biblio_seeds, &ctx.fetcher, sleeper, &ctx.shutdown).await {
            Ok(Response::BiblioMap(response)) => {
                item.merge_biblio(response);
            }
            Ok(_) => unreachable!("Method::Biblio always yields Response::BiblioMap"),
            Err(err) => {
                ctx.journal.record(item.id(), provider.name(), "biblio", &err).await;
                return;
            }
        }
    }
}

/// One MetricsThread(p)'s `process_item`: run `metrics` for exactly one
/// provider, stamping `null` on failure or an empty result (spec.md §4.5).
async fn metrics_worker_loop(ctx: Arc<WorkerContext>, queue: &dyn Queue, provider_name: &str) {
    let sleeper = TokioSleeper;
    let Some(provider) = ctx.registry.get(provider_name) else {
        tracing::error!(provider = %provider_name, "metrics worker has no matching provider in the registry");
        return;
    };

    while let Some(mut item) = dequeue_blocking(queue, &sleeper, &ctx.shutdown).await {
        let seeds = item.aliases.get(provider.namespaces_for(Method::Metrics));
        let timestamp = now_timestamp();

        match invoke(&provider, Method::Metrics, &seeds, &ctx.fetcher, &sleeper, &ctx.shutdown).await {
            Ok(Response::MetricMap(response)) if !response.is_empty() => {
                item.stamp_metric_values(response, &timestamp);
            }
            Ok(Response::MetricMap(_)) => {
                item.stamp_metrics(provider.metric_names(), &timestamp, None);
            }
            Ok(_) => unreachable!("Method::Metrics always yields Response::MetricMap"),
            Err(err) => {
                ctx.journal.record(item.id(), provider.name(), "metrics", &err).await;
                item.stamp_metrics(provider.metric_names(), &timestamp, None);
            }
        }

        queue.save_and_unqueue(item);
    }
}

/// An opaque timestamp key, matching the "the same metric-name never gets
/// two values at the same timestamp" invariant (spec.md §3) by deriving
/// from wall-clock time with enough resolution that two stamps in the same
/// process tick still sort distinctly.
fn now_timestamp() -> String {
    let now = chrono::Utc::now();
    format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros())
}
