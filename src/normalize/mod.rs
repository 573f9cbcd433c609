// src/normalize/mod.rs
//! Boundary between adapter output and the aggregate: names are cleaned, prices and
//! stock signals are mapped onto the canonical [`Listing`] fields.

pub mod price;
pub mod stock;

pub use price::{parse_price, parse_price_digits, parse_price_value, MIN_VALID_PRICE};
pub use stock::{classify_stock, classify_stock_text};

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::error::PriceParseError;
use crate::listing::{Listing, RawListing, RawPrice};

const MAX_NAME_CHARS: usize = 300;

/// Normalize display text: decode entities, strip tags, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > MAX_NAME_CHARS {
        out = out.chars().take(MAX_NAME_CHARS).collect();
    }
    out
}

/// Turn one raw listing into a canonical one, or say why it cannot be used.
pub fn normalize_listing(raw: RawListing) -> Result<Listing, PriceParseError> {
    let name = normalize_text(&raw.name);
    if name.is_empty() {
        return Err(PriceParseError::EmptyName);
    }
    let price = parse_price_value(&raw.raw_price).ok_or_else(|| {
        PriceParseError::NoPrice(match &raw.raw_price {
            RawPrice::Text(s) | RawPrice::Digits(s) => s.clone(),
            RawPrice::Number(v) => v.to_string(),
        })
    })?;

    Ok(Listing {
        name,
        url: raw.url.trim().to_string(),
        price,
        store: raw.store,
        availability: classify_stock(&raw.raw_stock),
        relevance: None,
    })
}

/// Normalize a whole adapter batch. Returns the usable listings and how many were dropped.
pub fn normalize_batch(raws: Vec<RawListing>) -> (Vec<Listing>, usize) {
    let mut dropped = 0usize;
    let mut out = Vec::with_capacity(raws.len());
    for raw in raws {
        match normalize_listing(raw) {
            Ok(l) => out.push(l),
            Err(e) => {
                tracing::debug!(target: "normalize", error = %e, "listing dropped");
                dropped += 1;
            }
        }
    }
    (out, dropped)
}
