// tests/e2e_scenario.rs
//
// Full search path through `SearchService`: fetch → normalize → aggregate → view
// filters, with the session cache in front. Stub stores only; the Tokio clock is
// paused so timeouts resolve instantly.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use price_aggregator::adapters::{AdapterPolicy, AdapterRegistry, SourceAdapter};
use price_aggregator::aggregate::{RelevancePolicy, SortKey, ViewFilters};
use price_aggregator::error::AdapterError;
use price_aggregator::listing::{Availability, RawListing, RawStock};
use price_aggregator::orchestrator::Orchestrator;
use price_aggregator::{ResultCache, SearchRequest, SearchService};

/// Returns canned rows after `delay`, or hangs forever when `rows` is `None`.
struct Canned {
    name: &'static str,
    delay: Duration,
    rows: Option<Vec<(&'static str, &'static str, &'static str)>>,
    calls: AtomicUsize,
}

impl Canned {
    fn new(
        name: &'static str,
        delay_ms: u64,
        rows: Option<Vec<(&'static str, &'static str, &'static str)>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            delay: Duration::from_millis(delay_ms),
            rows,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SourceAdapter for Canned {
    async fn fetch(&self, _query: &str) -> Result<Vec<RawListing>, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let Some(rows) = &self.rows else {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            return Ok(vec![]);
        };
        Ok(rows
            .iter()
            .map(|(name, price, stock)| {
                RawListing::new(self.name, *name, "https://example.test/p", *price, RawStock::from(*stock))
            })
            .collect())
    }

    fn name(&self) -> &str {
        self.name
    }
}

fn policy() -> AdapterPolicy {
    AdapterPolicy::standard(Duration::from_secs(5))
}

fn scenario() -> (SearchService, Arc<Canned>) {
    let a = Canned::new("A", 10, Some(vec![("RTX 4070 Super 12GB", "31.999,00", "in stock")]));
    let b = Canned::new("B", 0, None);
    let c = Canned::new("C", 50, Some(vec![("RTX 4070 Super 12GB", "31999", "sold out")]));
    let reg = AdapterRegistry::new()
        .with(a.clone(), policy())
        .with(b, policy())
        .with(c, policy());
    (
        SearchService::new(reg, Orchestrator::new(3), RelevancePolicy::AllTerms),
        a,
    )
}

#[tokio::test(start_paused = true)]
async fn duplicate_offers_collapse_and_timeout_is_diagnosed() {
    let (svc, _) = scenario();
    let mut cache: ResultCache = ResultCache::default();

    let resp = svc.search(&mut cache, &SearchRequest::new("rtx 4070"), |_| {}).await;

    assert_eq!(resp.listings.len(), 1, "{:?}", resp.listings);
    let only = &resp.listings[0];
    assert_eq!(only.price, 31_999);
    assert_eq!(only.store, "A");
    assert_eq!(only.availability, Availability::InStock);

    assert_eq!(resp.diagnostics.len(), 1);
    assert!(resp.diagnostics["B"].starts_with("timed out"));
    assert!(!resp.from_cache);
    assert!(resp.suggestions.is_empty());
}

#[tokio::test(start_paused = true)]
async fn repeat_search_is_served_from_cache() {
    let (svc, a) = scenario();
    let mut cache: ResultCache = ResultCache::default();
    let req = SearchRequest::new("rtx 4070");

    let first = svc.search(&mut cache, &req, |_| {}).await;
    let mut progress = 0;
    let second = svc.search(&mut cache, &req, |_| progress += 1).await;

    assert!(second.from_cache);
    assert_eq!(progress, 0);
    assert_eq!(a.calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.listings, second.listings);
    assert_eq!(first.diagnostics, second.diagnostics);
    assert!(second.reports.is_empty());
}

#[tokio::test(start_paused = true)]
async fn view_filters_apply_to_cached_aggregate() {
    let reg = AdapterRegistry::new().with(
        Canned::new(
            "A",
            0,
            Some(vec![
                ("Kingston 32GB DDR4 RAM 3200", "4,200", "in stock"),
                ("Corsair 32GB DDR4 RAM 3600", "5,100", "out of stock"),
                ("Corsair 16GB DDR4 RAM", "2,100", "in stock"),
            ]),
        ),
        policy(),
    );
    let svc = SearchService::new(reg, Orchestrator::new(2), RelevancePolicy::AllTerms);
    let mut cache: ResultCache = ResultCache::default();

    let all = svc.search(&mut cache, &SearchRequest::new("32gb ddr4 ram"), |_| {}).await;
    assert_eq!(all.total, 2);

    let filtered = SearchRequest {
        filters: ViewFilters {
            stock: [Availability::InStock].into(),
            sort: Some(SortKey::PriceDesc),
            ..Default::default()
        },
        ..SearchRequest::new("32gb ddr4 ram")
    };
    let resp = svc.search(&mut cache, &filtered, |_| {}).await;
    assert!(resp.from_cache);
    assert_eq!(resp.total, 2);
    assert_eq!(resp.listings.len(), 1);
    assert_eq!(resp.listings[0].price, 4_200);
}

#[tokio::test(start_paused = true)]
async fn total_failure_is_empty_with_suggestions_and_not_cached() {
    let reg = AdapterRegistry::new()
        .with(Canned::new("A", 0, None), policy())
        .with(Canned::new("B", 0, None), policy());
    let svc = SearchService::new(reg, Orchestrator::new(2), RelevancePolicy::AllTerms);
    let mut cache: ResultCache = ResultCache::default();

    let resp = svc.search(&mut cache, &SearchRequest::new("rtx 4070"), |_| {}).await;

    assert!(resp.listings.is_empty());
    assert_eq!(resp.diagnostics.len(), 2);
    assert_eq!(resp.suggestions, vec!["geforce rtx 4070", "nvidia rtx 4070"]);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn store_subset_limits_the_fetch() {
    let (svc, a) = scenario();
    let mut cache: ResultCache = ResultCache::default();
    let req = SearchRequest {
        stores: BTreeSet::from(["c".to_string(), "nope".to_string()]),
        ..SearchRequest::new("rtx 4070")
    };

    let resp = svc.search(&mut cache, &req, |_| {}).await;

    assert_eq!(a.calls.load(Ordering::SeqCst), 0);
    assert_eq!(resp.listings.len(), 1);
    assert_eq!(resp.listings[0].store, "C");
    assert_eq!(resp.listings[0].availability, Availability::OutOfStock);
    assert!(resp.diagnostics.is_empty());
}

#[tokio::test]
async fn blank_query_does_not_fetch() {
    let (svc, a) = scenario();
    let mut cache: ResultCache = ResultCache::default();
    let resp = svc.search(&mut cache, &SearchRequest::new("   "), |_| {}).await;
    assert!(resp.listings.is_empty());
    assert!(resp.fetched_at.is_none());
    assert_eq!(a.calls.load(Ordering::SeqCst), 0);
}
