//! The built-in Github provider. Grounded on
//! `original_source/totalimpact/providers/github.py`: a repo identified by
//! a `github` alias of the form `"owner,repo"` is queried against the
//! Github REST API for its watcher/fork counts and basic biblio fields.

use super::{Method, ProviderExtractor};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use ti_core::{Alias, ProviderError};

const NAMESPACE: &str = "github";

pub struct Github {
    namespaces: Vec<String>,
    metric_names: Vec<String>,
}

impl Github {
    pub fn new() -> Self {
        Self {
            namespaces: vec![NAMESPACE.to_string()],
            metric_names: vec!["github:watchers".to_string(), "github:forks".to_string()],
        }
    }

    /// `github.py`'s `_get_templated_url` override: the alias id is stored
    /// as `"owner,repo"` (so it survives as a single alias value) and is
    /// rewritten to `owner/repo` before substitution into the API template.
    fn repo_path(alias: &Alias) -> Result<String, ProviderError> {
        let (owner, repo) = alias
            .id
            .split_once(',')
            .ok_or_else(|| ProviderError::validation_failed(format!("not an \"owner,repo\" github alias: {}", alias.id)))?;
        Ok(format!("{owner}/{repo}"))
    }

    fn parse(body: &str) -> Result<Value, ProviderError> {
        serde_json::from_str(body).map_err(|e| ProviderError::content_malformed(format!("github: {e}")))
    }

    /// `github.py`'s `provenance_url_templates`: each metric links to a
    /// different page on the repo (watchers vs. the fork/network listing).
    fn provenance_path(metric_name: &str) -> Option<&'static str> {
        match metric_name {
            "github:watchers" => Some("watchers"),
            "github:forks" => Some("network/members"),
            _ => None,
        }
    }
}

impl Default for Github {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderExtractor for Github {
    fn provides_biblio(&self) -> bool {
        true
    }

    fn provides_metrics(&self) -> bool {
        true
    }

    fn provides_members(&self) -> bool {
        true
    }

    fn biblio_namespaces(&self) -> &[String] {
        &self.namespaces
    }

    fn metric_namespaces(&self) -> &[String] {
        &self.namespaces
    }

    fn metric_names(&self) -> &[String] {
        &self.metric_names
    }

    fn default_template(&self, _method: Method) -> String {
        "https://api.github.com/repos/{id}".to_string()
    }

    fn is_relevant_alias(&self, alias: &Alias) -> bool {
        alias.namespace == NAMESPACE && alias.id.contains(',')
    }

    /// `_get_templated_url`: the alias id is stored as `"owner,repo"` and
    /// rewritten to `owner/repo` before substitution (see `repo_path`).
    fn build_url(&self, template: &str, alias: &Alias) -> String {
        match Self::repo_path(alias) {
            Ok(path) => template.replace("{id}", &path),
            Err(_) => template.replace("{id}", &alias.id),
        }
    }

    async fn aliases(&self, _aliases: &[Alias], _url: &str, _body: &str) -> Result<Vec<Alias>, ProviderError> {
        Ok(Vec::new())
    }

    async fn biblio(
        &self,
        _aliases: &[Alias],
        url: &str,
        body: &str,
    ) -> Result<HashMap<String, Value>, ProviderError> {
        let parsed = Self::parse(body)?;
        let mut biblio = HashMap::new();
        for field in ["full_name", "description", "language", "created_at"] {
            if let Some(v) = parsed.get(field) {
                biblio.insert(field.to_string(), v.clone());
            }
        }
        if biblio.is_empty() {
            return Err(ProviderError::content_malformed(format!("github: no recognised biblio fields in {url}")));
        }
        Ok(biblio)
    }

    async fn metrics(&self, _aliases: &[Alias], url: &str, body: &str) -> Result<HashMap<String, f64>, ProviderError> {
        let parsed = Self::parse(body)?;
        let mut metrics = HashMap::new();
        if let Some(n) = parsed.get("watchers_count").and_then(Value::as_f64) {
            metrics.insert("github:watchers".to_string(), n);
        }
        if let Some(n) = parsed.get("forks_count").and_then(Value::as_f64) {
            metrics.insert("github:forks".to_string(), n);
        }
        if metrics.is_empty() {
            return Err(ProviderError::content_malformed(format!("github: no recognised metric fields in {url}")));
        }
        Ok(metrics)
    }

    fn provenance_url(&self, metric_name: &str, alias: &Alias) -> Option<String> {
        let suffix = Self::provenance_path(metric_name)?;
        let path = Self::repo_path(alias).ok()?;
        Some(format!("https://github.com/{path}/{suffix}"))
    }

    /// `_extract_members`: `body` is a JSON array of repo objects for the
    /// user named in `aliases`' id (everything before the first comma, or
    /// the whole id when there is no comma); each repo becomes a new
    /// `"owner,repo"`-shaped github alias.
    async fn members(&self, aliases: &[Alias], _url: &str, body: &str) -> Result<Vec<Alias>, ProviderError> {
        let owner = aliases
            .first()
            .map(|a| a.id.split(',').next().unwrap_or(&a.id).to_string())
            .unwrap_or_default();

        let parsed = Self::parse(body)?;
        let repos = parsed
            .as_array()
            .ok_or_else(|| ProviderError::content_malformed("github: expected an array of repos"))?;

        Ok(repos
            .iter()
            .filter_map(|repo| repo.get("name").and_then(Value::as_str))
            .map(|name| Alias::new(NAMESPACE, format!("{owner},{name}")))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alias() -> Alias {
        Alias::new("github", "totalimpact,example-repo")
    }

    #[test]
    fn repo_path_rewrites_comma_to_slash() {
        assert_eq!(Github::repo_path(&alias()).unwrap(), "totalimpact/example-repo");
    }

    #[test]
    fn repo_path_rejects_aliases_without_a_comma() {
        let bad = Alias::new("github", "not-a-repo-id");
        assert!(Github::repo_path(&bad).is_err());
    }

    #[test]
    fn is_relevant_alias_requires_comma_shaped_id() {
        let gh = Github::new();
        assert!(gh.is_relevant_alias(&alias()));
        assert!(!gh.is_relevant_alias(&Alias::new("github", "no-comma")));
        assert!(!gh.is_relevant_alias(&Alias::new("doi", "10.1/x")));
    }

    #[tokio::test]
    async fn metrics_extracts_watcher_and_fork_counts() {
        let gh = Github::new();
        let body = r#"{"watchers_count": 42, "forks_count": 7}"#;
        let metrics = gh.metrics(&[alias()], "https://api.github.com/repos/x/y", body).await.unwrap();
        assert_eq!(metrics.get("github:watchers"), Some(&42.0));
        assert_eq!(metrics.get("github:forks"), Some(&7.0));
    }

    #[tokio::test]
    async fn metrics_rejects_unparsable_json_as_content_malformed() {
        let gh = Github::new();
        let err = gh.metrics(&[alias()], "u", "not json").await.unwrap_err();
        assert_eq!(err.kind(), ti_core::ErrorKind::ContentMalformed);
    }

    #[tokio::test]
    async fn biblio_extracts_known_fields_only() {
        let gh = Github::new();
        let body = r#"{"full_name": "totalimpact/example-repo", "language": "Rust", "unrelated": 1}"#;
        let biblio = gh.biblio(&[alias()], "u", body).await.unwrap();
        assert_eq!(biblio.get("full_name").unwrap(), "totalimpact/example-repo");
        assert!(!biblio.contains_key("unrelated"));
    }

    #[test]
    fn provenance_url_differs_between_watchers_and_forks() {
        let gh = Github::new();
        assert_eq!(
            gh.provenance_url("github:watchers", &alias()),
            Some("https://github.com/totalimpact/example-repo/watchers".to_string())
        );
        assert_eq!(
            gh.provenance_url("github:forks", &alias()),
            Some("https://github.com/totalimpact/example-repo/network/members".to_string())
        );
    }

    #[test]
    fn provenance_url_is_none_for_an_unrecognised_metric() {
        let gh = Github::new();
        assert_eq!(gh.provenance_url("github:unknown", &alias()), None);
    }

    #[test]
    fn build_url_rewrites_comma_to_slash_before_interpolating() {
        let gh = Github::new();
        let url = gh.build_url("https://api.github.com/repos/{id}", &alias());
        assert_eq!(url, "https://api.github.com/repos/totalimpact/example-repo");
    }

    #[tokio::test]
    async fn members_enumerates_repos_owned_by_the_user() {
        let gh = Github::new();
        let body = r#"[{"name": "repo-one"}, {"name": "repo-two"}]"#;
        let owner_alias = Alias::new("github", "totalimpact");

        let members = gh.members(&[owner_alias], "u", body).await.unwrap();

        assert_eq!(members.len(), 2);
        assert!(members.contains(&Alias::new("github", "totalimpact,repo-one")));
        assert!(members.contains(&Alias::new("github", "totalimpact,repo-two")));
    }

    #[tokio::test]
    async fn members_rejects_unparsable_json_as_content_malformed() {
        let gh = Github::new();
        let err = gh.members(&[Alias::new("github", "totalimpact")], "u", "not json").await.unwrap_err();
        assert_eq!(err.kind(), ti_core::ErrorKind::ContentMalformed);
    }
}
