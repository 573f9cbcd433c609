// src/config/adapters.rs
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::adapters::http::HttpProfile;
use crate::listing::PriceFormat;

/// Which response shape the store's search endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// WordPress AJAX search: `{"suggestions": [...]}`
    Suggestions,
    /// OpenCart Journal3 search: `{"response": [...]}`
    Journal3,
}

fn default_query_param() -> String {
    "query".to_string()
}

/// One `[[adapters]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
    pub name: String,
    pub kind: AdapterKind,
    pub endpoint: String,
    #[serde(default = "default_query_param")]
    pub query_param: String,
    /// Static extra query parameters (`action`, `post_type`, ...).
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Base for resolving relative product links.
    #[serde(default)]
    pub base_url: Option<String>,
    /// `locale` (default) or `digits`.
    #[serde(default)]
    pub price_format: PriceFormat,
    #[serde(default)]
    pub unreliable: bool,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub http: HttpProfile,
}
