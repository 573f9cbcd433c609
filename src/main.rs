//! Price aggregator service: binary entrypoint.
//! Boots the Axum HTTP server with the configured stores, session cache and `/metrics`.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use price_aggregator::config::AppConfig;

/// Local log output, opt-in with `AGGREGATOR_DEV_LOG=1` (`AGGREGATOR_LOG_JSON=1` for JSON lines).
/// A subscriber installed by the runtime takes precedence.
fn enable_dev_tracing() {
    let dev_flag = std::env::var("AGGREGATOR_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");
    if !dev_flag {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("orchestrator=info,search=info,api=info,warn"));
    let json = std::env::var("AGGREGATOR_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    enable_dev_tracing();

    let cfg = AppConfig::load_default()?;
    tracing::info!(
        stores = cfg.adapters.len(),
        max_concurrency = cfg.search.max_concurrency,
        cache_ttl_secs = cfg.search.cache_ttl_secs,
        "configuration loaded"
    );
    let router = price_aggregator::app(&cfg)?;

    Ok(router.into())
}
