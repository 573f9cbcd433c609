// src/adapters/mod.rs
//! Store adapters: the `SourceAdapter` contract, the registry the orchestrator
//! consults, and the two configurable HTTP adapter families.

pub mod http;
pub mod journal3;
pub mod registry;
pub mod suggestions;
pub mod types;

pub use registry::{AdapterPolicy, AdapterRegistry, RegisteredAdapter};
pub use types::SourceAdapter;

use anyhow::Result;
use std::sync::Arc;

use crate::config::{AdapterConfig, AdapterKind, AppConfig};
use http::HttpSource;
use journal3::Journal3Adapter;
use suggestions::SuggestionSearchAdapter;

/// Build one live adapter from its config table.
pub fn build_adapter(cfg: &AdapterConfig) -> Arc<dyn SourceAdapter> {
    let source = HttpSource {
        endpoint: cfg.endpoint.clone(),
        query_param: cfg.query_param.clone(),
        params: cfg
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        profile: cfg.http.clone(),
    };
    match cfg.kind {
        AdapterKind::Suggestions => Arc::new(
            SuggestionSearchAdapter::http(cfg.name.clone(), source, cfg.base_url.clone())
                .with_price_format(cfg.price_format),
        ),
        AdapterKind::Journal3 => Arc::new(
            Journal3Adapter::http(cfg.name.clone(), source, cfg.base_url.clone())
                .with_price_format(cfg.price_format),
        ),
    }
}

/// Registry with every configured store and its run policy.
pub fn registry_from_config(cfg: &AppConfig) -> Result<AdapterRegistry> {
    let mut reg = AdapterRegistry::new();
    for a in &cfg.adapters {
        // Surface broken header profiles at startup rather than on every search.
        a.http
            .header_map()
            .map_err(|e| anyhow::anyhow!("adapter {:?}: {e}", a.name))?;
        reg.register(build_adapter(a), cfg.search.policy_for(a));
    }
    tracing::info!(stores = reg.len(), "adapter registry built");
    Ok(reg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::PriceFormat;

    #[test]
    fn registry_carries_policies_from_config() {
        let cfg = AppConfig::from_toml_str(
            r#"
[[adapters]]
name = "Alfrensia"
kind = "suggestions"
endpoint = "https://alfrensia.example/wp-admin/admin-ajax.php"
params = { action = "flatsome_ajax_search_products" }
unreliable = true

[[adapters]]
name = "AHW"
kind = "journal3"
endpoint = "https://ahw.example/index.php"
query_param = "search"
params = { route = "journal3/search" }
price_format = "digits"
"#,
        )
        .unwrap();
        let reg = registry_from_config(&cfg).unwrap();
        assert_eq!(reg.names(), vec!["AHW".to_string(), "Alfrensia".to_string()]);
        assert_eq!(reg.get("Alfrensia").unwrap().policy.max_attempts, 3);
        assert_eq!(reg.get("AHW").unwrap().policy.max_attempts, 1);
        assert_eq!(cfg.adapters[0].price_format, PriceFormat::Locale);
        assert_eq!(cfg.adapters[1].price_format, PriceFormat::Digits);
    }
}
