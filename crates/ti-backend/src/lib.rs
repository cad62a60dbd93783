//! The Backend Supervisor crate: configuration, the alias/metrics worker
//! topology, the error journal, and signal handling (spec.md §4.5, §6, §7).

pub mod config;
pub mod journal;
pub mod signals;
pub mod supervisor;

pub use config::{BackendConfig, ConfigError};
pub use journal::Journal;
pub use supervisor::{spawn_workers, WorkerContext};

use std::sync::Arc;
use ti_providers::{Github, ProviderRegistry, ProviderSpec, TemplateOverrides};
use ti_queue::{InMemoryQueue, Queue};

/// Build a provider registry from configuration. Only `"github"` has a
/// built-in extractor (spec.md §1: "the subject of this specification...
/// the provider-specific extractors... are out of scope" beyond one
/// illustrative provider); any other configured name is logged and skipped
/// rather than failing startup.
pub fn build_registry(config: &BackendConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for (name, provider_config) in &config.providers {
        let extractor: Arc<dyn ti_providers::ProviderExtractor> = match name.as_str() {
            "github" => Arc::new(Github::new()),
            other => {
                tracing::warn!(provider = other, "no built-in extractor for this provider name; skipping");
                continue;
            }
        };

        let overrides = TemplateOverrides {
            aliases: provider_config.aliases_url.clone(),
            biblio: provider_config.biblio_url.clone(),
            metrics: provider_config.metrics_url.clone(),
        };

        registry.register(ProviderSpec::new(
            name.clone(),
            extractor,
            overrides,
            provider_config.errors.clone(),
            provider_config.rate_limit_config(),
            provider_config.timeout_sec,
        ));
    }
    registry
}

/// Build the per-provider metrics queues named in `config`, one
/// `InMemoryQueue` per configured provider (spec.md §6:
/// `MetricsQueue(provider_name)`).
pub fn build_metrics_queues(
    config: &BackendConfig,
    registry: &ProviderRegistry,
) -> Vec<(String, u32, Arc<dyn Queue>)> {
    registry
        .metrics_providers()
        .map(|provider| {
            let workers = config.providers.get(provider.name()).map(|p| p.workers).unwrap_or(1);
            let queue: Arc<dyn Queue> = Arc::new(InMemoryQueue::new());
            (provider.name().to_string(), workers, queue)
        })
        .collect()
}
