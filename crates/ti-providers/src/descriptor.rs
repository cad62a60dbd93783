//! The provider descriptor (spec.md §4.1 "Provider Descriptor (C1)") and the
//! registry that resolves a configured provider name to one. Grounded on the
//! REDESIGN FLAGS note in spec.md §9: "Re-architect as a registry keyed by
//! provider name... selection is data-driven, not reflection-driven" —
//! replacing the Python `ProviderFactory.get_providers` class-name lookup.

use crate::extractors::{Method, ProviderExtractor};
use std::collections::HashMap;
use std::sync::Arc;
use ti_core::{Alias, PolicyTable};
use ti_ratelimit::{RateLimitConfig, RateLimitState};

/// Per-method URL template overrides loaded from config (spec.md §6:
/// `metrics_url / aliases_url / biblio_url: optional override templates`).
#[derive(Debug, Clone, Default)]
pub struct TemplateOverrides {
    pub aliases: Option<String>,
    pub biblio: Option<String>,
    pub metrics: Option<String>,
}

/// A configured provider: its capability-bearing extractor plus the
/// namespaces it recognises, its retry policy table, its rate-limit state,
/// and any URL template overrides. Lives as long as the supervisor (spec.md
/// §3 Lifecycles).
pub struct ProviderSpec {
    name: String,
    extractor: Arc<dyn ProviderExtractor>,
    templates: TemplateOverrides,
    policy: PolicyTable,
    rate_limit: RateLimitState,
    timeout_secs: u64,
}

impl ProviderSpec {
    pub fn new(
        name: impl Into<String>,
        extractor: Arc<dyn ProviderExtractor>,
        templates: TemplateOverrides,
        policy: PolicyTable,
        rate_limit_config: RateLimitConfig,
        timeout_secs: u64,
    ) -> Self {
        Self {
            name: name.into(),
            extractor,
            templates,
            policy,
            rate_limit: RateLimitState::new(rate_limit_config),
            timeout_secs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extractor(&self) -> &Arc<dyn ProviderExtractor> {
        &self.extractor
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    pub fn rate_limit(&self) -> &RateLimitState {
        &self.rate_limit
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn provides(&self, method: Method) -> bool {
        match method {
            Method::Aliases => self.extractor.provides_aliases(),
            Method::Biblio => self.extractor.provides_biblio(),
            Method::Metrics => self.extractor.provides_metrics(),
        }
    }

    pub fn namespaces_for(&self, method: Method) -> &[String] {
        match method {
            Method::Aliases => self.extractor.alias_namespaces(),
            Method::Biblio => self.extractor.biblio_namespaces(),
            Method::Metrics => self.extractor.metric_namespaces(),
        }
    }

    /// The effective URL template for `method`: a config override if
    /// present, otherwise the extractor's default (spec.md §4.1
    /// `template_for(method)`).
    pub fn template_for(&self, method: Method) -> String {
        let override_template = match method {
            Method::Aliases => self.templates.aliases.as_deref(),
            Method::Biblio => self.templates.biblio.as_deref(),
            Method::Metrics => self.templates.metrics.as_deref(),
        };
        override_template.map(str::to_string).unwrap_or_else(|| self.extractor.default_template(method))
    }

    pub fn metric_names(&self) -> &[String] {
        self.extractor.metric_names()
    }

    pub fn is_relevant_alias(&self, alias: &Alias) -> bool {
        self.extractor.is_relevant_alias(alias)
    }

    /// Whether this provider can enumerate the items a collection alias
    /// represents (spec.md §3 [SUPPLEMENT]).
    pub fn provides_members(&self) -> bool {
        self.extractor.provides_members()
    }
}

/// A registry of providers keyed by name, walked in insertion ("config")
/// order by the AliasThread (spec.md §4.5: "walks all providers in order").
#[derive(Default)]
pub struct ProviderRegistry {
    order: Vec<String>,
    providers: HashMap<String, Arc<ProviderSpec>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: ProviderSpec) {
        let name = provider.name().to_string();
        self.order.push(name.clone());
        self.providers.insert(name, Arc::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<Arc<ProviderSpec>> {
        self.providers.get(name).cloned()
    }

    /// Providers in configured order (spec.md §4.5: AliasThread walks "all
    /// providers in order").
    pub fn in_order(&self) -> impl Iterator<Item = Arc<ProviderSpec>> + '_ {
        self.order.iter().map(move |name| self.providers[name].clone())
    }

    pub fn metrics_providers(&self) -> impl Iterator<Item = Arc<ProviderSpec>> + '_ {
        self.in_order().filter(|p| p.provides(Method::Metrics))
    }
}
