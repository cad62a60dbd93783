//! The `ProviderExtractor` trait: the thing a provider actually implements
//! (spec.md §4.1). Grounded on `original_source/totalimpact/providers/*.py`'s
//! `Provider` base class — `_extract_aliases`/`_extract_biblio`/
//! `_extract_metrics`/`is_relevant_alias`/`_get_templated_url` become async
//! trait methods instead of instance methods on a class hierarchy.

pub mod github;

use async_trait::async_trait;
use ti_core::{Alias, ProviderError};

/// The three capability-bearing operations a provider can answer (spec.md
/// §3 "Provider method").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Aliases,
    Biblio,
    Metrics,
}

/// A provider's content-extraction logic, decoupled from transport and
/// retry (both handled by the invocation engine). One implementor per
/// provider; built-ins live in this module, e.g. [`github::Github`].
#[async_trait]
pub trait ProviderExtractor: Send + Sync {
    fn provides_aliases(&self) -> bool {
        false
    }
    fn provides_biblio(&self) -> bool {
        false
    }
    fn provides_metrics(&self) -> bool {
        false
    }
    /// Whether this provider can enumerate the items a collection alias
    /// represents, e.g. the repos owned by a Github user (spec.md §3
    /// [SUPPLEMENT], grounded on `github.py`'s `provides_members`).
    fn provides_members(&self) -> bool {
        false
    }

    /// Namespaces this provider accepts as an alias seed for its `aliases`
    /// method (spec.md §4.1 "namespaces it cares about").
    fn alias_namespaces(&self) -> &[String] {
        &[]
    }
    fn biblio_namespaces(&self) -> &[String] {
        &[]
    }
    fn metric_namespaces(&self) -> &[String] {
        &[]
    }

    /// The metric names this provider stamps, in the order they should be
    /// recorded (spec.md §4.1).
    fn metric_names(&self) -> &[String] {
        &[]
    }

    /// The default URL template for `method`, before any config override
    /// (spec.md §4.1 `template_for`). Providers that don't support a method
    /// never have it called.
    fn default_template(&self, method: Method) -> String;

    /// Interpolate `alias` into `template` to produce the URL actually
    /// fetched. Defaults to verbatim `{namespace}`/`{id}` substitution;
    /// providers whose alias id isn't usable as-is (spec.md §4.1
    /// `template_for`: "providers may override, e.g. replace `,` with `/`
    /// before interpolating") override this, e.g. [`github::Github`]'s
    /// comma-to-slash rewrite.
    fn build_url(&self, template: &str, alias: &Alias) -> String {
        template.replace("{id}", &alias.id).replace("{namespace}", &alias.namespace)
    }

    /// Whether `alias` is one this provider can act on. Defaults to a
    /// namespace-membership check; Github overrides this to additionally
    /// require a `"owner,repo"`-shaped id (spec.md supplement, grounded on
    /// `github.py`'s `is_relevant_alias`).
    fn is_relevant_alias(&self, alias: &Alias) -> bool {
        self.alias_namespaces().iter().any(|ns| ns == &alias.namespace)
            || self.biblio_namespaces().iter().any(|ns| ns == &alias.namespace)
            || self.metric_namespaces().iter().any(|ns| ns == &alias.namespace)
    }

    /// Parse a fetched body for `url` into new aliases. `aliases` is the
    /// item's current alias subset relevant to this provider (spec.md §4.3
    /// step 2: `item.aliases.get(provider.namespaces_for(method))`). Only
    /// called when `provides_aliases()` is true.
    async fn aliases(&self, aliases: &[Alias], url: &str, body: &str) -> Result<Vec<Alias>, ProviderError>;

    /// Parse a fetched body into biblio fields. Only called when
    /// `provides_biblio()` is true.
    async fn biblio(
        &self,
        aliases: &[Alias],
        url: &str,
        body: &str,
    ) -> Result<std::collections::HashMap<String, serde_json::Value>, ProviderError>;

    /// Parse a fetched body into metric values, one per entry in
    /// `metric_names()` present in the response. Only called when
    /// `provides_metrics()` is true.
    async fn metrics(
        &self,
        aliases: &[Alias],
        url: &str,
        body: &str,
    ) -> Result<std::collections::HashMap<String, f64>, ProviderError>;

    /// A human-facing provenance URL for one metric reading, or `None` if
    /// this provider doesn't publish one (spec.md supplement, grounded on
    /// `github.py`'s per-metric `provenance_url` templates).
    fn provenance_url(&self, _metric_name: &str, _alias: &Alias) -> Option<String> {
        None
    }

    /// Enumerate the items a collection alias represents, e.g. the repos
    /// owned by a Github user (spec.md §3 [SUPPLEMENT], grounded on
    /// `github.py`'s `_extract_members`). Only called when
    /// `provides_members()` is true.
    async fn members(&self, _aliases: &[Alias], _url: &str, _body: &str) -> Result<Vec<Alias>, ProviderError> {
        Ok(Vec::new())
    }
}
