//! Runs one search from the command line and prints progress plus the ranked result.
//!
//! `search_demo <query> [store,...] [--offline]`: live stores from the loaded config,
//! or two canned in-memory stores with `--offline` (or when no stores are configured).

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use price_aggregator::adapters::journal3::Journal3Adapter;
use price_aggregator::adapters::suggestions::SuggestionSearchAdapter;
use price_aggregator::adapters::{AdapterPolicy, AdapterRegistry};
use price_aggregator::aggregate::RelevancePolicy;
use price_aggregator::orchestrator::Orchestrator;
use price_aggregator::{AppConfig, SearchRequest, SearchService};
use tracing_subscriber::EnvFilter;

const SIGMA_FIXTURE: &str = r#"{"suggestions":[
  {"value":"Sapphire Pulse RX 7600 8GB","url":"https://sigma.example/p/rx7600","price":"<bdi>13.750,00&nbsp;EGP</bdi>","stock":"In stock"},
  {"value":"ASUS Dual RTX 4060 8GB","url":"https://sigma.example/p/4060","price":"<bdi>16,499.00&nbsp;EGP</bdi>","stock":"Out of stock"}
]}"#;

const AHW_FIXTURE: &str = r#"{"response":[
  {"name":"Sapphire Pulse RX 7600 8GB","href":"/index.php?product_id=77","price":"14,200 EGP","special":"13,750 EGP","quantity":4},
  {"name":"Sapphire Pulse RX 7600 XT 16GB","href":"/index.php?product_id=78","price":"18,900 EGP","special":false,"quantity":0}
]}"#;

fn offline_service() -> SearchService {
    let policy = AdapterPolicy::standard(Duration::from_secs(5));
    let registry = AdapterRegistry::new()
        .with(Arc::new(SuggestionSearchAdapter::from_fixture("Sigma", SIGMA_FIXTURE)), policy)
        .with(Arc::new(Journal3Adapter::from_fixture("AHW", AHW_FIXTURE)), policy);
    SearchService::new(registry, Orchestrator::default(), RelevancePolicy::AllTerms)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("orchestrator=info,search=info,warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();

    let mut offline = false;
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--offline" {
            offline = true;
        } else {
            positional.push(arg);
        }
    }
    let query = positional
        .first()
        .cloned()
        .filter(|q| !q.trim().is_empty())
        .unwrap_or_else(|| "rx 7600".to_string());
    let stores: BTreeSet<String> = positional
        .get(1)
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let cfg = AppConfig::load_default()?;
    let service = if offline || cfg.adapters.is_empty() {
        offline_service()
    } else {
        SearchService::from_config(&cfg)?
    };
    let mut cache = cfg.search.new_cache();
    let req = SearchRequest {
        stores,
        ..SearchRequest::new(query)
    };

    let resp = service
        .search(&mut cache, &req, |ev| match &ev.error {
            Some(e) => println!("  [{}] failed: {e}", ev.store),
            None => println!("  [{}] {} listings", ev.store, ev.count),
        })
        .await;

    println!("\n{} result(s) for {:?}", resp.total, resp.query);
    for l in &resp.listings {
        println!("{:>10}  {:<12} {:?}  {}", l.price, l.store, l.availability, l.name);
    }
    for (store, reason) in &resp.diagnostics {
        println!("! {store}: {reason}");
    }
    if !resp.suggestions.is_empty() {
        println!("try: {}", resp.suggestions.join(" | "));
    }
    Ok(())
}
