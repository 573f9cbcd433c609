// src/listing.rs
//! Core data model: raw adapter output, normalized listings and per-adapter results.

use serde::{Deserialize, Serialize};

use crate::error::AdapterError;

/// Stock state after normalization. Adapter-specific vocabulary never gets past this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Availability {
    InStock,
    OutOfStock,
    Unknown,
}

impl Availability {
    /// Parse the snake_case form used in query strings (`in_stock`, `out_of_stock`, `unknown`).
    pub fn from_param(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "in_stock" | "instock" => Some(Self::InStock),
            "out_of_stock" | "outofstock" => Some(Self::OutOfStock),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Price as the site reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Number(f64),
    Text(String),
    /// Text read by keeping every digit, for stores that print whole amounts
    /// with arbitrary grouping. Never produced by deserialization.
    Digits(String),
}

/// How a store's price text should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceFormat {
    /// First number in the text, `.`/`,` resolved by position.
    #[default]
    Locale,
    /// Every digit in the text, separators ignored.
    Digits,
}

impl PriceFormat {
    pub fn text(self, s: String) -> RawPrice {
        match self {
            PriceFormat::Locale => RawPrice::Text(s),
            PriceFormat::Digits => RawPrice::Digits(s),
        }
    }
}

impl From<&str> for RawPrice {
    fn from(s: &str) -> Self {
        RawPrice::Text(s.to_string())
    }
}

impl From<String> for RawPrice {
    fn from(s: String) -> Self {
        RawPrice::Text(s)
    }
}

impl From<f64> for RawPrice {
    fn from(v: f64) -> Self {
        RawPrice::Number(v)
    }
}

/// Stock signal as the site reported it: a text/markup fragment or a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RawStock {
    Text(String),
    Quantity(i64),
    #[default]
    Missing,
}

impl From<&str> for RawStock {
    fn from(s: &str) -> Self {
        RawStock::Text(s.to_string())
    }
}

/// One product offer exactly as an adapter produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    pub name: String,
    pub url: String,
    pub raw_price: RawPrice,
    #[serde(default)]
    pub raw_stock: RawStock,
    pub store: String,
}

impl RawListing {
    pub fn new(
        store: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        raw_price: impl Into<RawPrice>,
        raw_stock: RawStock,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            raw_price: raw_price.into(),
            raw_stock,
            store: store.into(),
        }
    }
}

/// One normalized product offer from one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub name: String,
    pub url: String,
    /// Whole currency units; always > 1.
    pub price: u64,
    pub store: String,
    pub availability: Availability,
    /// Set only by the weighted relevance policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f32>,
}

impl Listing {
    /// Key used for de-duplication.
    pub fn dedup_key(&self) -> (&str, u64) {
        (self.name.as_str(), self.price)
    }
}

/// Outcome of running one adapter once (all attempts included).
#[derive(Debug)]
pub struct AdapterResult {
    pub store: String,
    pub listings: Vec<Listing>,
    pub error: Option<AdapterError>,
    /// Listings the normalizer rejected (unparseable price, empty name).
    pub dropped: usize,
    pub attempts: u32,
    pub elapsed: std::time::Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_params_accept_common_spellings() {
        assert_eq!(Availability::from_param("in_stock"), Some(Availability::InStock));
        assert_eq!(Availability::from_param("Out-Of-Stock"), Some(Availability::OutOfStock));
        assert_eq!(Availability::from_param(" unknown "), Some(Availability::Unknown));
        assert_eq!(Availability::from_param("maybe"), None);
    }

    #[test]
    fn raw_price_deserializes_number_or_text() {
        let n: RawPrice = serde_json::from_str("1299.5").unwrap();
        assert_eq!(n, RawPrice::Number(1299.5));
        let t: RawPrice = serde_json::from_str(r#""1.299,50 EGP""#).unwrap();
        assert_eq!(t, RawPrice::Text("1.299,50 EGP".into()));
    }
}
