// src/adapters/journal3.rs
//! OpenCart Journal3 theme search (`index.php?route=journal3/search`):
//! `{"response": [{"name", "href", "price", "special", "quantity"}]}`.

use async_trait::async_trait;
use metrics::histogram;
use serde::Deserialize;
use serde_json::Value;

use super::http::{resolve_link, HttpSource, Transport};
use super::suggestions::json_price;
use super::types::SourceAdapter;
use crate::error::AdapterError;
use crate::listing::{PriceFormat, RawListing, RawStock};

#[derive(Debug, Deserialize)]
struct Journal3Resp {
    response: Vec<Journal3Item>,
}

#[derive(Debug, Deserialize)]
struct Journal3Item {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    price: Option<Value>,
    // OpenCart sends `false` when there is no special price.
    #[serde(default)]
    special: Option<Value>,
    #[serde(default)]
    quantity: Option<Value>,
}

pub struct Journal3Adapter {
    name: String,
    base_url: Option<String>,
    price_format: PriceFormat,
    transport: Transport,
}

impl Journal3Adapter {
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
        let resp: Journal3Resp = serde_json::from_str(body)?;

        let mut out = Vec::with_capacity(resp.response.len());
        for it in resp.response {
            let (Some(name), Some(href)) = (it.name, it.href) else {
                continue;
            };
            let price = it.special.filter(is_present).or(it.price);
            out.push(RawListing {
                name,
                url: resolve_link(self.base_url.as_deref(), &href),
                raw_price: json_price(price, self.price_format),
                raw_stock: quantity(it.quantity.as_ref()),
                store: self.name.clone(),
            });
        }

        histogram!("adapter_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }
}

fn is_present(v: &Value) -> bool {
    match v {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn quantity(v: Option<&Value>) -> RawStock {
    match v {
        Some(Value::Number(n)) => n.as_i64().map(RawStock::Quantity).unwrap_or_default(),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(RawStock::Quantity)
            .unwrap_or_else(|_| RawStock::Text(s.clone())),
        _ => RawStock::Missing,
    }
}

#[async_trait]
impl SourceAdapter for Journal3Adapter {
    async fn fetch(&self, query: &str) -> Result<Vec<RawListing>, AdapterError> {
        let body = self.transport.body(query).await?;
        self.parse_body(&body)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
