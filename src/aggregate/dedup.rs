// src/aggregate/dedup.rs
use std::collections::HashSet;

use crate::listing::Listing;

/// Collapse listings with the same `(name, price)`; the first occurrence wins.
pub fn dedup_listings(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen: HashSet<(String, u64)> = HashSet::with_capacity(listings.len());
    listings
        .into_iter()
        .filter(|l| seen.insert((l.name.clone(), l.price)))
        .collect()
}
