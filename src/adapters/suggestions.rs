// src/adapters/suggestions.rs
//! WordPress AJAX product search (Flatsome / Woodmart / FiboSearch style):
//! `{"suggestions": [{"value": "...", "url"|"permalink": "...", "price": "<html>"}]}`.

use async_trait::async_trait;
use metrics::histogram;
use serde::Deserialize;
use serde_json::Value;

use super::http::{resolve_link, HttpSource, Transport};
use super::types::SourceAdapter;
use crate::error::AdapterError;
use crate::listing::{PriceFormat, RawListing, RawPrice, RawStock};

#[derive(Debug, Deserialize)]
struct SuggestionsResp {
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    permalink: Option<String>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    stock: Option<String>,
}

pub struct SuggestionSearchAdapter {
    name: String,
    base_url: Option<String>,
    price_format: PriceFormat,
    transport: Transport,
}

impl SuggestionSearchAdapter {
    pub fn from_fixture(name: impl Into<String>, body: &str) -> Self {
        Self {
            name: name.into(),
            base_url: None,
            price_format: PriceFormat::Locale,
            transport: Transport::Fixture(body.to_string()),
        }
    }

    pub fn http(name: impl Into<String>, source: HttpSource, base_url: Option<String>) -> Self {
        Self {
            name: name.into(),
            base_url,
            price_format: PriceFormat::Locale,
            transport: Transport::Http(source),
        }
    }

    pub fn with_price_format(mut self, format: PriceFormat) -> Self {
        self.price_format = format;
        self
    }

    fn parse_body(&self, body: &str) -> Result<Vec<RawListing>, AdapterError> {
        let t0 = std::time::Instant::now();
        let resp: SuggestionsResp = serde_json::from_str(body)?;

        let mut out = Vec::with_capacity(resp.suggestions.len());
        for s in resp.suggestions {
            // "No products found" rows carry no link.
            let Some(link) = s.url.or(s.permalink).filter(|l| !l.trim().is_empty()) else {
                continue;
            };
            let name = s.value.unwrap_or_default();
            out.push(RawListing {
                name,
                url: resolve_link(self.base_url.as_deref(), &link),
                raw_price: json_price(s.price, self.price_format),
                raw_stock: s.stock.map(RawStock::Text).unwrap_or_default(),
                store: self.name.clone(),
            });
        }

        histogram!("adapter_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }
}

/// Prices arrive as HTML snippets, plain strings or bare numbers.
pub(crate) fn json_price(v: Option<Value>, format: PriceFormat) -> RawPrice {
    match v {
        Some(Value::Number(n)) => n
            .as_f64()
            .map(RawPrice::Number)
            .unwrap_or_else(|| format.text(n.to_string())),
        Some(Value::String(s)) => format.text(s),
        _ => RawPrice::Text(String::new()),
    }
}

#[async_trait]
impl SourceAdapter for SuggestionSearchAdapter {
    async fn fetch(&self, query: &str) -> Result<Vec<RawListing>, AdapterError> {
        let body = self.transport.body(query).await?;
        self.parse_body(&body)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
