// src/orchestrator.rs
//! Concurrent fetch across the selected stores.
//!
//! - At most `max_concurrency` adapters run at once (semaphore permits); the rest queue.
//! - Every attempt has its own deadline, started once the adapter holds a permit.
//!   On expiry the attempt's future is dropped, which cancels its I/O.
//! - Unreliable adapters get several attempts with a fixed back-off; the others get one.
//! - An error, timeout or panic in one adapter never affects the others. A panic
//!   counts as a failed attempt, so unreliable adapters retry after it.
//! - Results are joined back on the calling task in completion order; the progress
//!   callback runs there too, once per adapter.

use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::adapters::{AdapterRegistry, RegisteredAdapter};
use crate::error::AdapterError;
use crate::listing::{AdapterResult, Listing};
use crate::normalize::normalize_batch;

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("adapter_listings_total", "Listings kept after normalization.");
        describe_counter!(
            "adapter_listings_dropped_total",
            "Listings dropped by the normalizer (bad price or name)."
        );
        describe_counter!("adapter_fetch_errors_total", "Adapters that ended in failure.");
        describe_counter!("adapter_retries_total", "Extra attempts made for unreliable adapters.");
        describe_histogram!("adapter_fetch_ms", "Wall time per adapter, all attempts included.");
        describe_histogram!("adapter_parse_ms", "Adapter response parse time in milliseconds.");
    });
}

/// Emitted once per adapter as soon as it finishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub store: String,
    pub count: usize,
    pub error: Option<String>,
}

/// Per-adapter summary kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterReport {
    pub store: String,
    pub count: usize,
    pub dropped: usize,
    pub attempts: u32,
    pub elapsed_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Union of every successful adapter's listings, in completion order.
    pub listings: Vec<Listing>,
    /// One entry per adapter, in completion order.
    pub reports: Vec<AdapterReport>,
    /// `store -> reason` for failed adapters.
    pub diagnostics: BTreeMap<String, String>,
    /// Listings the normalizer rejected, all stores together.
    pub dropped: usize,
}

impl FetchOutcome {
    fn absorb(&mut self, result: AdapterResult) -> ProgressEvent {
        let AdapterResult {
            store,
            listings,
            error,
            dropped,
            attempts,
            elapsed,
        } = result;

        let count = listings.len();
        let reason = error.as_ref().map(|e| e.to_string());
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        histogram!("adapter_fetch_ms", "store" => store.clone()).record(elapsed_ms as f64);
        counter!("adapter_listings_dropped_total").increment(dropped as u64);
        match &error {
            Some(e) => {
                warn!(target: "orchestrator", store = %store, attempts, error = %e, "adapter failed");
                counter!("adapter_fetch_errors_total", "store" => store.clone(), "kind" => e.kind())
                    .increment(1);
                self.diagnostics.insert(store.clone(), e.to_string());
            }
            None => {
                info!(target: "orchestrator", store = %store, count, dropped, elapsed_ms, "adapter done");
                counter!("adapter_listings_total").increment(count as u64);
            }
        }

        self.listings.extend(listings);
        self.dropped += dropped;
        self.reports.push(AdapterReport {
            store: store.clone(),
            count,
            dropped,
            attempts,
            elapsed_ms,
            error: reason.clone(),
        });
        ProgressEvent {
            store,
            count,
            error: reason,
        }
    }

    pub fn all_failed(&self) -> bool {
        !self.reports.is_empty() && self.diagnostics.len() == self.reports.len()
    }
}

/// Bounded-concurrency runner for a set of adapters.
#[derive(Debug, Clone, Copy)]
pub struct Orchestrator {
    max_concurrency: usize,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

impl Orchestrator {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Run every adapter in `registry` for `query`. Never fails: adapter errors end
    /// up in `FetchOutcome::diagnostics`.
    pub async fn fetch_all<F>(
        &self,
        query: &str,
        registry: &AdapterRegistry,
        mut on_progress: F,
    ) -> FetchOutcome
    where
        F: FnMut(&ProgressEvent),
    {
        ensure_metrics_described();

        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let query: Arc<str> = Arc::from(query);
        let mut tasks = JoinSet::new();
        let mut stores = HashMap::new();

        for (name, reg) in registry.iter() {
            let permits = Arc::clone(&permits);
            let query = Arc::clone(&query);
            let reg = reg.clone();
            let store = name.clone();
            let handle = tasks.spawn(async move {
                // Held until this adapter is completely done, retries included.
                let _permit = permits.acquire_owned().await.ok();
                run_adapter(store, reg, &query).await
            });
            stores.insert(handle.id(), name.clone());
        }

        debug!(
            target: "orchestrator",
            adapters = registry.len(),
            max_concurrency = self.max_concurrency,
            "fetch started"
        );

        let mut outcome = FetchOutcome::default();
        while let Some(joined) = tasks.join_next_with_id().await {
            let result = match joined {
                Ok((_, result)) => result,
                // Only reachable for a panic outside `fetch` (normalization).
                Err(e) => AdapterResult {
                    store: stores.get(&e.id()).cloned().unwrap_or_default(),
                    listings: Vec::new(),
                    error: Some(AdapterError::Panicked),
                    dropped: 0,
                    attempts: 1,
                    elapsed: Duration::ZERO,
                },
            };
            let event = outcome.absorb(result);
            on_progress(&event);
        }
        outcome
    }
}

async fn run_adapter(store: String, reg: RegisteredAdapter, query: &str) -> AdapterResult {
    let policy = reg.policy;
    let max_attempts = policy.max_attempts.max(1);
    let started = Instant::now();
    let mut attempts = 0;
    let mut last_error = None;

    while attempts < max_attempts {
        attempts += 1;
        let attempt = AssertUnwindSafe(reg.adapter.fetch(query)).catch_unwind();
        match timeout(policy.timeout, attempt).await {
            Ok(Ok(Ok(mut raws))) => {
                for r in &mut raws {
                    r.store.clone_from(&store);
                }
                let (listings, dropped) = normalize_batch(raws);
                return AdapterResult {
                    store,
                    listings,
                    error: None,
                    dropped,
                    attempts,
                    elapsed: started.elapsed(),
                };
            }
            Ok(Ok(Err(e))) => last_error = Some(e),
            Ok(Err(_)) => last_error = Some(AdapterError::Panicked),
            Err(_) => last_error = Some(AdapterError::Timeout(policy.timeout)),
        }

        if attempts < max_attempts {
            debug!(
                target: "orchestrator",
                store = %store,
                attempt = attempts,
                error = ?last_error,
                "retrying after back-off"
            );
            counter!("adapter_retries_total").increment(1);
            sleep(policy.backoff).await;
        }
    }

    AdapterResult {
        store,
        listings: Vec::new(),
        error: last_error,
        dropped: 0,
        attempts,
        elapsed: started.elapsed(),
    }
}
