// src/search.rs
//! `search(query, stores, filters)`: cache lookup → concurrent fetch on miss →
//! aggregation → view filters.
//!
//! The cache is owned by the caller (one per session) and only touched here, on the
//! calling task, never from inside adapter tasks. Lookup and store are two separate
//! calls, so a shared cache is not held while stores are being fetched.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::info;

use crate::adapters::{registry_from_config, AdapterRegistry};
use crate::aggregate::{aggregate, validity_filter, RelevancePolicy, ViewFilters};
use crate::cache::{CacheKey, CachedFetch, FetchCache};
use crate::config::AppConfig;
use crate::orchestrator::{AdapterReport, Orchestrator, ProgressEvent};
use crate::suggest::suggest_alternatives;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("search_requests_total", "Searches served.");
        describe_counter!("search_cache_hits_total", "Searches answered from the cache.");
        describe_counter!("search_cache_misses_total", "Searches that triggered a fetch.");
        describe_counter!("cache_evictions_total", "Cache entries evicted for capacity.");
    });
}

#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    /// Empty = every registered store.
    pub stores: BTreeSet<String>,
    pub filters: ViewFilters,
    /// Overrides the service's default relevance policy for this request.
    pub relevance: Option<RelevancePolicy>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub listings: Vec<crate::listing::Listing>,
    /// Size of the ranked aggregate before view filters.
    pub total: usize,
    /// `store -> reason` for stores that failed.
    pub diagnostics: BTreeMap<String, String>,
    /// Per-store run details; empty when served from the cache.
    pub reports: Vec<AdapterReport>,
    pub from_cache: bool,
    /// Alternate queries, only when nothing relevant was found.
    pub suggestions: Vec<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl SearchResponse {
    fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            listings: Vec::new(),
            total: 0,
            diagnostics: BTreeMap::new(),
            reports: Vec::new(),
            from_cache: false,
            suggestions: Vec::new(),
            fetched_at: None,
        }
    }
}

pub struct SearchService {
    registry: AdapterRegistry,
    orchestrator: Orchestrator,
    policy: RelevancePolicy,
}

impl SearchService {
    pub fn new(registry: AdapterRegistry, orchestrator: Orchestrator, policy: RelevancePolicy) -> Self {
        Self {
            registry,
            orchestrator,
            policy,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            registry_from_config(cfg)?,
            Orchestrator::new(cfg.search.max_concurrency),
            cfg.search.relevance_policy(&cfg.scoring),
        ))
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Never fails: store failures are reported in `diagnostics`, and total failure is
    /// an empty list with a full diagnostics map.
    pub async fn search<C, F>(&self, cache: &mut C, req: &SearchRequest, on_progress: F) -> SearchResponse
    where
        C: FetchCache,
        F: FnMut(&ProgressEvent),
    {
        ensure_metrics_described();
        counter!("search_requests_total").increment(1);

        let query = req.query.trim();
        if query.is_empty() {
            return SearchResponse::empty(query);
        }
        let selected = self.registry.select(&req.stores);
        if selected.is_empty() {
            return SearchResponse::empty(query);
        }

        let key = CacheKey::new(query, selected.names());
        let (fetched, from_cache, reports) = match cache.get(&key) {
            Some(hit) => {
                counter!("search_cache_hits_total").increment(1);
                info!(target: "search", query, "cache hit");
                (hit, true, Vec::new())
            }
            None => {
                counter!("search_cache_misses_total").increment(1);
                let outcome = self
                    .orchestrator
                    .fetch_all(query, &selected, on_progress)
                    .await;
                let all_failed = outcome.all_failed();
                let fetched = CachedFetch {
                    listings: validity_filter(outcome.listings),
                    diagnostics: outcome.diagnostics,
                    fetched_at: Utc::now(),
                };
                // A total outage is not worth remembering for a whole TTL.
                if !all_failed {
                    cache.put(key, fetched.clone());
                }
                (fetched, false, outcome.reports)
            }
        };

        let policy = req.relevance.as_ref().unwrap_or(&self.policy);
        let ranked = aggregate(fetched.listings, query, policy);
        let listings = req.filters.apply(&ranked);
        let suggestions = if ranked.is_empty() {
            suggest_alternatives(query)
        } else {
            Vec::new()
        };

        info!(
            target: "search",
            query,
            from_cache,
            total = ranked.len(),
            shown = listings.len(),
            failed = fetched.diagnostics.len(),
            "search done"
        );

        SearchResponse {
            query: query.to_string(),
            listings,
            total: ranked.len(),
            diagnostics: fetched.diagnostics,
            reports,
            from_cache,
            suggestions,
            fetched_at: Some(fetched.fetched_at),
        }
    }
}
