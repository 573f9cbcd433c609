// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod adapters;
pub mod aggregate;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod listing;
pub mod metrics;
pub mod normalize;
pub mod orchestrator;
pub mod search;
pub mod suggest;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::cache::{CacheKey, CachedFetch, FetchCache, ResultCache, SharedCache};
pub use crate::config::AppConfig;
pub use crate::listing::{Availability, Listing, RawListing};
pub use crate::search::{SearchRequest, SearchResponse, SearchService};

use axum::Router;

/// Full HTTP app: search API plus `/metrics`.
pub fn app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let metrics = metrics::Metrics::init(&cfg.search)?;
    let state = api::AppState::from_config(cfg)?;
    Ok(api::router(state).merge(metrics.router()))
}
