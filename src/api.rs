use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use crate::aggregate::{RelevancePolicy, ScoringConfig, SortKey, ViewFilters};
use crate::cache::{CachedFetch, ResultCache, SharedCache};
use crate::config::AppConfig;
use crate::listing::Availability;
use crate::orchestrator::AdapterReport;
use crate::search::{SearchRequest, SearchResponse, SearchService};

#[derive(Clone)]
pub struct AppState {
    service: Arc<SearchService>,
    /// One cache per running process, locked per lookup or store only.
    cache: SharedCache,
    scoring: ScoringConfig,
    last: Arc<RwLock<Option<LastSearch>>>,
}

impl AppState {
    pub fn new(service: SearchService, cache: ResultCache<CachedFetch>, scoring: ScoringConfig) -> Self {
        Self {
            service: Arc::new(service),
            cache: SharedCache::new(cache),
            scoring,
            last: Arc::new(RwLock::new(None)),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            SearchService::from_config(cfg)?,
            cfg.search.new_cache(),
            cfg.scoring.clone(),
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/stores", get(stores))
        .route("/search", get(search))
        .route("/cache/clear", post(clear_cache))
        .route("/debug/last-diagnostics", get(debug_last_diagnostics))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct StoreOut {
    name: String,
    timeout_ms: u64,
    max_attempts: u32,
    /// Longest this store can take, retries and back-off included.
    worst_case_ms: u64,
}

async fn stores(State(state): State<AppState>) -> Json<Vec<StoreOut>> {
    let out = state
        .service
        .registry()
        .iter()
        .map(|(name, reg)| StoreOut {
            name: name.clone(),
            timeout_ms: u64::try_from(reg.policy.timeout.as_millis()).unwrap_or(u64::MAX),
            max_attempts: reg.policy.max_attempts,
            worst_case_ms: u64::try_from(reg.policy.worst_case().as_millis()).unwrap_or(u64::MAX),
        })
        .collect();
    Json(out)
}

/// Query string for `GET /search`. List values are comma-separated.
#[derive(Debug, Default, serde::Deserialize)]
struct SearchParams {
    q: String,
    #[serde(default)]
    stores: Option<String>,
    /// View-only store filter over the fetched stores; does not change the cache key.
    #[serde(default)]
    only: Option<String>,
    #[serde(default)]
    min_price: Option<u64>,
    #[serde(default)]
    max_price: Option<u64>,
    #[serde(default)]
    stock: Option<String>,
    #[serde(default)]
    sort: Option<String>,
    /// `all_terms` or `weighted`; absent keeps the configured mode.
    #[serde(default)]
    mode: Option<String>,
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl SearchParams {
    fn into_request(self, scoring: &ScoringConfig) -> Result<SearchRequest, String> {
        let stores: BTreeSet<String> = split_list(self.stores.as_deref()).map(String::from).collect();

        let mut stock = BTreeSet::new();
        for s in split_list(self.stock.as_deref()) {
            let a = Availability::from_param(s).ok_or_else(|| format!("unknown stock status {s:?}"))?;
            stock.insert(a);
        }

        let sort = match self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Some(SortKey::from_param(s).ok_or_else(|| format!("unknown sort key {s:?}"))?),
            None => None,
        };

        let relevance = match self.mode.as_deref().map(str::trim) {
            None | Some("") => None,
            Some("all_terms") => Some(RelevancePolicy::AllTerms),
            Some("weighted") => Some(RelevancePolicy::Weighted(scoring.clone())),
            Some(other) => return Err(format!("unknown relevance mode {other:?}")),
        };

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err("min_price is greater than max_price".to_string());
            }
        }

        Ok(SearchRequest {
            query: self.q,
            stores,
            filters: ViewFilters {
                min_price: self.min_price,
                max_price: self.max_price,
                stores: split_list(self.only.as_deref()).map(String::from).collect(),
                stock,
                sort,
            },
            relevance,
        })
    }
}

#[derive(Clone, serde::Serialize)]
struct LastSearch {
    query: String,
    from_cache: bool,
    diagnostics: std::collections::BTreeMap<String, String>,
    reports: Vec<AdapterReport>,
    at: DateTime<Utc>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let req = params
        .into_request(&state.scoring)
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let mut cache = state.cache.clone();
    let resp = state
        .service
        .search(&mut cache, &req, |ev| {
            metrics::counter!("api_progress_events_total").increment(1);
            tracing::debug!(
                target: "api",
                store = %ev.store,
                count = ev.count,
                error = ?ev.error,
                "store finished"
            );
        })
        .await;

    *state.last.write().await = Some(LastSearch {
        query: resp.query.clone(),
        from_cache: resp.from_cache,
        diagnostics: resp.diagnostics.clone(),
        reports: resp.reports.clone(),
        at: Utc::now(),
    });
    Ok(Json(resp))
}

async fn clear_cache(State(state): State<AppState>) -> String {
    let n = state.cache.clear();
    tracing::info!(target: "api", cleared = n, "cache cleared");
    format!("cleared {n}")
}

async fn debug_last_diagnostics(State(state): State<AppState>) -> Json<Option<LastSearch>> {
    Json(state.last.read().await.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(q: &str) -> SearchParams {
        SearchParams {
            q: q.into(),
            ..Default::default()
        }
    }

    #[test]
    fn lists_are_comma_separated_and_trimmed() {
        let p = SearchParams {
            stores: Some(" Sigma, ,AHW ".into()),
            stock: Some("in_stock,unknown".into()),
            sort: Some("price_desc".into()),
            ..params("rtx 4070")
        };
        let req = p.into_request(&ScoringConfig::default()).unwrap();
        assert_eq!(req.stores, ["AHW".to_string(), "Sigma".to_string()].into());
        assert_eq!(req.filters.stock, [Availability::InStock, Availability::Unknown].into());
        assert_eq!(req.filters.sort, Some(SortKey::PriceDesc));
        assert!(req.relevance.is_none());
        assert!(req.filters.stores.is_empty());
    }

    #[test]
    fn only_narrows_the_view_not_the_fetch() {
        let p = SearchParams {
            stores: Some("Sigma,AHW".into()),
            only: Some("ahw".into()),
            ..params("rx 7600")
        };
        let req = p.into_request(&ScoringConfig::default()).unwrap();
        assert_eq!(req.stores.len(), 2);
        assert_eq!(req.filters.stores, ["ahw".to_string()].into());
    }

    #[test]
    fn bad_values_are_rejected() {
        let bad_sort = SearchParams {
            sort: Some("cheapest".into()),
            ..params("x")
        };
        assert!(bad_sort.into_request(&ScoringConfig::default()).is_err());

        let inverted = SearchParams {
            min_price: Some(10),
            max_price: Some(5),
            ..params("x")
        };
        assert!(inverted.into_request(&ScoringConfig::default()).is_err());
    }
}
