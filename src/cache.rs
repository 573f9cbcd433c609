// src/cache.rs
//! Session-scoped result cache with a fixed TTL and a small capacity.
//!
//! - `get` treats expired entries as absent (and drops them); there is no sweeper.
//! - `put` stamps the entry with the current time; when over capacity the entry with
//!   the oldest `created_at` goes (insertion time, not access time).
//! - Timestamps come from `tokio::time::Instant`, so a paused test clock drives expiry.
//! - [`SharedCache`] is the cross-request handle: its lock is taken for one `get` or
//!   one `put`, never across a fetch.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

use crate::listing::Listing;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_ENTRIES: usize = 10;

/// `(query, sorted store-name set)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub query: String,
    pub stores: BTreeSet<String>,
}

impl CacheKey {
    pub fn new<I, S>(query: &str, stores: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            query: query.trim().to_string(),
            stores: stores.into_iter().map(Into::into).collect(),
        }
    }
}

/// What a search caches: the normalized union before relevance filtering, plus
/// which stores failed. Ranking and view filters re-run on every hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedFetch {
    pub listings: Vec<Listing>,
    pub diagnostics: BTreeMap<String, String>,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

#[derive(Debug)]
pub struct ResultCache<V = CachedFetch> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl<V: Clone> ResultCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<V> {
        let expired = match self.entries.get(key) {
            None => return None,
            Some(e) => e.created_at.elapsed() > self.ttl,
        };
        if expired {
            tracing::debug!(target: "cache", query = %key.query, "entry expired");
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| e.value.clone())
    }

    pub fn put(&mut self, key: CacheKey, value: V) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
        while self.entries.len() > self.max_entries {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            tracing::debug!(target: "cache", query = %oldest.query, "evicting oldest entry");
            metrics::counter!("cache_evictions_total").increment(1);
            self.entries.remove(&oldest);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where a search looks up and stores fetched unions.
pub trait FetchCache {
    fn get(&mut self, key: &CacheKey) -> Option<CachedFetch>;
    fn put(&mut self, key: CacheKey, value: CachedFetch);
}

impl FetchCache for ResultCache<CachedFetch> {
    fn get(&mut self, key: &CacheKey) -> Option<CachedFetch> {
        ResultCache::get(self, key)
    }

    fn put(&mut self, key: CacheKey, value: CachedFetch) {
        ResultCache::put(self, key, value)
    }
}

/// Clonable handle to one cache shared by concurrent searches. Two concurrent misses
/// on the same key both fetch; the later `put` wins.
#[derive(Clone, Default)]
pub struct SharedCache {
    inner: Arc<Mutex<ResultCache<CachedFetch>>>,
}

impl SharedCache {
    pub fn new(cache: ResultCache<CachedFetch>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Drop every entry; returns how many there were.
    pub fn clear(&self) -> usize {
        let mut cache = self.inner.lock();
        let n = cache.len();
        cache.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl FetchCache for SharedCache {
    fn get(&mut self, key: &CacheKey) -> Option<CachedFetch> {
        self.inner.lock().get(key)
    }

    fn put(&mut self, key: CacheKey, value: CachedFetch) {
        self.inner.lock().put(key, value)
    }
}
