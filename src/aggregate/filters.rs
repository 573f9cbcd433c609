// src/aggregate/filters.rs
//! Post-fetch view filters. They work on a copy of the cached aggregate and never
//! trigger a re-fetch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::relevance::by_score_then_price;
use crate::listing::{Availability, Listing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    PriceAsc,
    PriceDesc,
    Name,
    Store,
    Relevance,
}

impl SortKey {
    pub fn from_param(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price_asc" | "price" => Some(Self::PriceAsc),
            "price_desc" => Some(Self::PriceDesc),
            "name" => Some(Self::Name),
            "store" => Some(Self::Store),
            "relevance" => Some(Self::Relevance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewFilters {
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    /// Empty = every store. Case-insensitive.
    pub stores: BTreeSet<String>,
    /// Empty = every availability.
    pub stock: BTreeSet<Availability>,
    /// `None` keeps the aggregate's own order.
    pub sort: Option<SortKey>,
}

impl ViewFilters {
    fn keeps(&self, l: &Listing) -> bool {
        self.min_price.map_or(true, |min| l.price >= min)
            && self.max_price.map_or(true, |max| l.price <= max)
            && (self.stores.is_empty()
                || self.stores.iter().any(|s| s.eq_ignore_ascii_case(&l.store)))
            && (self.stock.is_empty() || self.stock.contains(&l.availability))
    }

    pub fn apply(&self, listings: &[Listing]) -> Vec<Listing> {
        let mut out: Vec<Listing> = listings.iter().filter(|l| self.keeps(l)).cloned().collect();
        if let Some(key) = self.sort {
            sort_listings(&mut out, key);
        }
        out
    }
}

/// Stable sort by the given key; ties fall back to price ascending.
pub fn sort_listings(listings: &mut [Listing], key: SortKey) {
    match key {
        SortKey::PriceAsc => listings.sort_by_key(|l| l.price),
        SortKey::PriceDesc => listings.sort_by(|a, b| b.price.cmp(&a.price)),
        SortKey::Name => listings.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.price.cmp(&b.price))
        }),
        SortKey::Store => listings.sort_by(|a, b| {
            a.store
                .to_lowercase()
                .cmp(&b.store.to_lowercase())
                .then(a.price.cmp(&b.price))
        }),
        SortKey::Relevance => listings.sort_by(by_score_then_price),
    }
}
