// src/aggregate/mod.rs
//! Aggregation & filter engine: turns the raw union of listings into the final
//! ranked list. Each step is a pure transformation:
//!
//! 1. validity (non-empty name, price > 1)
//! 2. relevance (all-terms, or weighted scoring)
//! 3. de-duplication by `(name, price)`, first occurrence wins
//! 4. stable sort (price ascending, or score desc / price asc when weighted)

pub mod dedup;
pub mod filters;
pub mod relevance;

pub use dedup::dedup_listings;
pub use filters::{sort_listings, SortKey, ViewFilters};
pub use relevance::{filter_all_terms, score_and_filter, RelevancePolicy, ScoringConfig};

use crate::listing::Listing;
use crate::normalize::MIN_VALID_PRICE;

/// Drop listings that must never reach the user.
pub fn validity_filter(listings: Vec<Listing>) -> Vec<Listing> {
    listings
        .into_iter()
        .filter(|l| !l.name.trim().is_empty() && l.price > MIN_VALID_PRICE)
        .collect()
}

/// Run the full pipeline for `query`.
pub fn aggregate(listings: Vec<Listing>, query: &str, policy: &RelevancePolicy) -> Vec<Listing> {
    let total = listings.len();
    let valid = validity_filter(listings);
    let valid_count = valid.len();

    let mut out = match policy {
        RelevancePolicy::AllTerms => filter_all_terms(valid, query),
        RelevancePolicy::Weighted(cfg) => score_and_filter(valid, query, cfg),
    };
    let relevant = out.len();

    out = dedup_listings(out);
    match policy {
        RelevancePolicy::AllTerms => sort_listings(&mut out, SortKey::PriceAsc),
        RelevancePolicy::Weighted(_) => sort_listings(&mut out, SortKey::Relevance),
    }

    tracing::debug!(
        target: "search",
        total,
        valid = valid_count,
        relevant,
        kept = out.len(),
        "aggregate built"
    );
    out
}
