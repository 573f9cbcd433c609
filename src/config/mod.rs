// src/config/mod.rs
//! Application configuration (TOML) with env overrides.
//!
//! Lookup order:
//! 1) `$AGGREGATOR_CONFIG_PATH` (must exist)
//! 2) `config/aggregator.toml`
//! 3) built-in defaults (no stores registered)

pub mod adapters;

pub use adapters::{AdapterConfig, AdapterKind};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::adapters::registry::{DEFAULT_BACKOFF, DEFAULT_TIMEOUT, UNRELIABLE_TIMEOUT};
use crate::adapters::AdapterPolicy;
use crate::aggregate::relevance::{RelevancePolicy, ScoringConfig};
use crate::cache::{CachedFetch, ResultCache};

pub const ENV_CONFIG_PATH: &str = "AGGREGATOR_CONFIG_PATH";
pub const ENV_MAX_CONCURRENCY: &str = "AGGREGATOR_MAX_CONCURRENCY";
pub const ENV_CACHE_TTL_SECS: &str = "AGGREGATOR_CACHE_TTL_SECS";
pub const DEFAULT_CONFIG_PATH: &str = "config/aggregator.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub adapters: Vec<AdapterConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceMode {
    #[default]
    AllTerms,
    Weighted,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub max_concurrency: usize,
    pub default_timeout_secs: u64,
    pub unreliable_timeout_secs: u64,
    pub retry_backoff_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
    pub relevance: RelevanceMode,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_concurrency: crate::orchestrator::DEFAULT_MAX_CONCURRENCY,
            default_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            unreliable_timeout_secs: UNRELIABLE_TIMEOUT.as_secs(),
            retry_backoff_ms: DEFAULT_BACKOFF.as_millis() as u64,
            cache_ttl_secs: 300,
            cache_max_entries: 10,
            relevance: RelevanceMode::AllTerms,
        }
    }
}

impl SearchSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// A fresh, empty session cache sized from these settings.
    pub fn new_cache(&self) -> ResultCache<CachedFetch> {
        ResultCache::new(self.cache_ttl(), self.cache_max_entries)
    }

    /// Run policy for one configured store.
    pub fn policy_for(&self, adapter: &AdapterConfig) -> AdapterPolicy {
        if adapter.unreliable {
            let secs = adapter.timeout_secs.unwrap_or(self.unreliable_timeout_secs);
            AdapterPolicy::unreliable(
                Duration::from_secs(secs),
                Duration::from_millis(self.retry_backoff_ms),
            )
        } else {
            let secs = adapter.timeout_secs.unwrap_or(self.default_timeout_secs);
            AdapterPolicy::standard(Duration::from_secs(secs))
        }
    }

    pub fn relevance_policy(&self, scoring: &ScoringConfig) -> RelevancePolicy {
        match self.relevance {
            RelevanceMode::AllTerms => RelevancePolicy::AllTerms,
            RelevanceMode::Weighted => RelevancePolicy::Weighted(scoring.clone()),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parsing aggregator config")?;
        cfg.sanitize()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Env path, then the default path, then built-in defaults; env overrides applied last.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::load_from(&default)?
            } else {
                tracing::warn!("no config file found; starting with defaults and no stores");
                Self::default()
            }
        };
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(n) = parse_env::<usize>(ENV_MAX_CONCURRENCY)? {
            self.search.max_concurrency = n;
        }
        if let Some(ttl) = parse_env::<u64>(ENV_CACHE_TTL_SECS)? {
            self.search.cache_ttl_secs = ttl;
        }
        self.sanitize()
    }

    fn sanitize(&mut self) -> Result<()> {
        self.search.max_concurrency = self.search.max_concurrency.max(1);
        self.search.cache_max_entries = self.search.cache_max_entries.max(1);
        self.scoring.min_score = self.scoring.min_score.clamp(0.0, 1.0);

        let mut seen = HashSet::new();
        for a in &self.adapters {
            if a.name.trim().is_empty() {
                bail!("adapter with empty name");
            }
            if !seen.insert(a.name.to_ascii_lowercase()) {
                bail!("duplicate adapter name {:?}", a.name);
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow!("{key} has invalid value {raw:?}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_search_settings() {
        let s = SearchSettings::default();
        assert_eq!(s.cache_ttl_secs, 300);
        assert_eq!(s.cache_max_entries, 10);
        assert!((5..=10).contains(&s.max_concurrency));
        assert_eq!(s.relevance, RelevanceMode::AllTerms);
        assert_eq!(s.default_timeout_secs, 10);
        assert_eq!(s.unreliable_timeout_secs, 20);
        assert_eq!(s.retry_backoff_ms, 1_000);
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let cfg = AppConfig::from_toml_str("[search]\nmax_concurrency = 0\n").unwrap();
        assert_eq!(cfg.search.max_concurrency, 1);
    }

    #[test]
    fn duplicate_names_rejected() {
        let toml = r#"
[[adapters]]
name = "Sigma"
kind = "suggestions"
endpoint = "https://a.example/search"

[[adapters]]
name = "sigma"
kind = "journal3"
endpoint = "https://b.example/search"
"#;
        assert!(AppConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unreliable_adapters_get_retries_and_longer_timeout() {
        let toml = r#"
[search]
default_timeout_secs = 5
unreliable_timeout_secs = 15
retry_backoff_ms = 250

[[adapters]]
name = "Flaky"
kind = "suggestions"
endpoint = "https://a.example/search"
unreliable = true

[[adapters]]
name = "Steady"
kind = "journal3"
endpoint = "https://b.example/search"
timeout_secs = 8
"#;
        let cfg = AppConfig::from_toml_str(toml).unwrap();
        let flaky = cfg.search.policy_for(&cfg.adapters[0]);
        assert_eq!(flaky.max_attempts, 3);
        assert_eq!(flaky.timeout, Duration::from_secs(15));
        assert_eq!(flaky.backoff, Duration::from_millis(250));
        let steady = cfg.search.policy_for(&cfg.adapters[1]);
        assert_eq!(steady.max_attempts, 1);
        assert_eq!(steady.timeout, Duration::from_secs(8));
    }
}
