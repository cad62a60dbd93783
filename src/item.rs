//! The item data model: aliases, biblio, and metric time series.
//! See spec.md §3.

use std::collections::{BTreeMap, HashMap};
use std::collections::HashSet;

/// A `(namespace, id)` pair identifying an item within one provider's
/// namespace. `id` is opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Alias {
    pub namespace: String,
    pub id: String,
}

impl Alias {
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), id: id.into() }
    }
}

/// A set of aliases, unique by `(namespace, id)`; insertion order is not
/// meaningful.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasSet {
    seen: HashSet<Alias>,
}

impl AliasSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The subset of aliases whose namespace is one of `namespaces`.
    pub fn get(&self, namespaces: &[String]) -> Vec<Alias> {
        self.seen.iter().filter(|a| namespaces.iter().any(|ns| ns == &a.namespace)).cloned().collect()
    }

    /// Add every alias in `aliases` not already present. Idempotent: calling
    /// twice with the same list leaves the set unchanged after the first
    /// call (spec.md §8 Invariant 2).
    pub fn add_unique(&mut self, aliases: impl IntoIterator<Item = Alias>) {
        for alias in aliases {
            self.seen.insert(alias);
        }
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alias> {
        self.seen.iter()
    }

    pub fn contains(&self, alias: &Alias) -> bool {
        self.seen.contains(alias)
    }
}

/// Bibliographic data: a string-keyed map of JSON-compatible values,
/// nested under `"data"` the way the Python `item.biblio["data"][key]`
/// merge does.
pub type Biblio = HashMap<String, serde_json::Value>;

/// One metric's time series: an ISO-ish timestamp key (the Python source
/// stamps `str(time.time())`; we keep the same "opaque string timestamp"
/// contract so a `null` stamp at a given instant can never collide with a
/// later real reading) mapped to a value or `null` (spec.md §3: "the same
/// metric-name never gets two values at the same timestamp").
pub type MetricSeries = BTreeMap<String, Option<f64>>;

pub type Metrics = HashMap<String, MetricSeries>;

/// The mutable aggregate of aliases + biblio + metric time series for one
/// artifact. Ephemeral: created by a queue pop, saved and discarded at
/// processor completion (spec.md §3 Lifecycles).
#[derive(Debug, Clone)]
pub struct Item {
    id: String,
    pub aliases: AliasSet,
    pub biblio: Biblio,
    pub metrics: Metrics,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), aliases: AliasSet::new(), biblio: Biblio::new(), metrics: Metrics::new() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Merge a provider's biblio response into `biblio["data"]`, the way
    /// `ProvidersAliasThread.process_item` does in
    /// `original_source/totalimpact/backend.py`.
    pub fn merge_biblio(&mut self, response: HashMap<String, serde_json::Value>) {
        let data = self
            .biblio
            .entry("data".to_string())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if let serde_json::Value::Object(map) = data {
            for (k, v) in response {
                map.insert(k, v);
            }
        }
    }

    /// Stamp a metric value (or `None` on failure/empty-result) at `timestamp`
    /// for every key in `keys`, creating the series if absent.
    pub fn stamp_metrics(&mut self, keys: &[String], timestamp: &str, value: Option<f64>) {
        for key in keys {
            self.metrics.entry(key.clone()).or_default().insert(timestamp.to_string(), value);
        }
    }

    /// Stamp distinct per-metric values from a provider response.
    pub fn stamp_metric_values(&mut self, response: HashMap<String, f64>, timestamp: &str) {
        for (key, value) in response {
            self.metrics.entry(key).or_default().insert(timestamp.to_string(), Some(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_set_add_unique_is_idempotent() {
        let mut set = AliasSet::new();
        let batch = vec![Alias::new("doi", "10.1/x"), Alias::new("github", "a,b")];
        set.add_unique(batch.clone());
        let after_first = set.clone();
        set.add_unique(batch);
        assert_eq!(set, after_first);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn alias_set_get_filters_by_namespace() {
        let mut set = AliasSet::new();
        set.add_unique(vec![Alias::new("doi", "10.1/x"), Alias::new("github", "a,b")]);
        let github_only = set.get(&["github".to_string()]);
        assert_eq!(github_only, vec![Alias::new("github", "a,b")]);
    }

    #[test]
    fn clear_empties_the_set() {
        let mut set = AliasSet::new();
        set.add_unique(vec![Alias::new("doi", "10.1/x")]);
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn merge_biblio_accumulates_under_data_key() {
        let mut item = Item::new("item-1");
        let mut first = HashMap::new();
        first.insert("title".to_string(), serde_json::json!("A Paper"));
        item.merge_biblio(first);

        let mut second = HashMap::new();
        second.insert("year".to_string(), serde_json::json!(2020));
        item.merge_biblio(second);

        let data = item.biblio.get("data").unwrap().as_object().unwrap();
        assert_eq!(data.get("title").unwrap(), "A Paper");
        assert_eq!(data.get("year").unwrap(), 2020);
    }

    #[test]
    fn stamp_metrics_never_overwrites_a_different_timestamp() {
        let mut item = Item::new("item-1");
        item.stamp_metrics(&["github:watchers".to_string()], "100.0", Some(5.0));
        item.stamp_metrics(&["github:watchers".to_string()], "200.0", None);
        let series = &item.metrics["github:watchers"];
        assert_eq!(series.get("100.0"), Some(&Some(5.0)));
        assert_eq!(series.get("200.0"), Some(&None));
        assert_eq!(series.len(), 2);
    }
}
