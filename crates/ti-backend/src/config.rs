//! Layered TOML configuration (spec.md §6), matching the nested shape
//! `abp-config` loads for the agent backplane: a single `Deserialize`
//! tree with `#[serde(default)]` at every optional level.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use ti_core::PolicyTable;
use ti_ratelimit::RateLimitConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },
    #[error("parsing config file {path}: {source}")]
    Parse { path: String, #[source] source: toml::de::Error },
    #[error("provider {name:?} has no workers configured")]
    NoWorkers { name: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub aliases: AliasesConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub db_name: Option<String>,
    pub db_url: Option<String>,
    pub db_username: Option<String>,
    pub db_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub workers: u32,
    pub metrics_url: Option<String>,
    pub aliases_url: Option<String>,
    pub biblio_url: Option<String>,
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,
    #[serde(default)]
    pub rate_period_sec: u64,
    #[serde(default)]
    pub rate_limit: u32,
    #[serde(default)]
    pub throttled: bool,
    #[serde(default)]
    pub errors: PolicyTable,
}

fn default_timeout_sec() -> u64 {
    20
}

impl ProviderConfig {
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            rate_period_secs: self.rate_period_sec,
            rate_limit: self.rate_limit,
            throttled: self.throttled,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AliasesConfig {
    pub workers: u32,
}

impl Default for AliasesConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_cache_duration_sec: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_cache_duration_sec: 86_400 }
    }
}

impl BackendConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        Self::parse(&raw, path)
    }

    fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: BackendConfig = toml::from_str(raw)
            .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?;
        for (name, provider) in &config.providers {
            if provider.workers == 0 {
                tracing::warn!(provider = %name, "provider configured with zero metrics workers");
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_documented_shape() {
        let toml_src = r#"
            db_name = "totalimpact"
            db_url = "http://localhost:5984"

            [cache]
            max_cache_duration_sec = 3600

            [aliases]
            workers = 4

            [providers.github]
            workers = 2
            timeout_sec = 15
            rate_period_sec = 3600
            rate_limit = 5000
            throttled = true

            [providers.github.errors.http_timeout]
            retries = 3
            retry_delay_secs = 0.5
        "#;
        let config = BackendConfig::parse(toml_src, Path::new("test.toml")).unwrap();
        assert_eq!(config.aliases.workers, 4);
        assert_eq!(config.cache.max_cache_duration_sec, 3600);
        let github = &config.providers["github"];
        assert_eq!(github.workers, 2);
        assert_eq!(github.timeout_sec, 15);
        assert!(github.throttled);
    }

    #[test]
    fn missing_sections_take_documented_defaults() {
        let config = BackendConfig::parse("", Path::new("test.toml")).unwrap();
        assert_eq!(config.aliases.workers, 1);
        assert_eq!(config.cache.max_cache_duration_sec, 86_400);
        assert!(config.providers.is_empty());
    }
}
