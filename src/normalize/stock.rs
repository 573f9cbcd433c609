// src/normalize/stock.rs
//! Stock signal → [`Availability`].
//!
//! Negative signals always win over positive ones; no recognized signal means
//! `Unknown`. Classification never fails.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::listing::{Availability, RawStock};

const NEGATIVE_PHRASES: &[&str] = &[
    "out of stock",
    "out-of-stock",
    "outofstock",
    "sold out",
    "sold-out",
    "soldout",
    "not in stock",
    "not-in-stock",
    "no stock",
    "unavailable",
    "not available",
    "غير متوفر",
    "نفد المخزون",
    "نفدت الكمية",
    "نفذت الكمية",
];

const POSITIVE_PHRASES: &[&str] = &[
    "add to cart",
    "add-to-cart",
    "add_to_cart",
    "in stock",
    "in-stock",
    "instock",
    "available",
    "builds only",
    "buy now",
    "متوفر",
    "أضف إلى السلة",
    "اضف الى السلة",
];

const PURCHASE_HINTS: &[&str] = &["cart", "buy", "purchase", "السلة"];

fn re_opening_tag() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(?:button|input|a)\b([^>]*)>([^<]*)").expect("opening tag regex")
    })
}

fn re_disabled_attr() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bdisabled\b").expect("disabled attr regex"))
}

fn re_quantity_left() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bonly\s+\d+\s+left\b|\b\d+\s+left\b").expect("quantity regex")
    })
}

fn re_ws() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

/// Classify any raw stock signal.
pub fn classify_stock(raw: &RawStock) -> Availability {
    match raw {
        RawStock::Text(s) => classify_stock_text(s),
        RawStock::Quantity(n) if *n > 0 => Availability::InStock,
        RawStock::Quantity(_) => Availability::OutOfStock,
        RawStock::Missing => Availability::Unknown,
    }
}

/// Classify a free-text or markup fragment.
pub fn classify_stock_text(fragment: &str) -> Availability {
    let decoded = html_escape::decode_html_entities(fragment);
    let lower = re_ws()
        .replace_all(&decoded.to_lowercase(), " ")
        .into_owned();

    if NEGATIVE_PHRASES.iter().any(|p| lower.contains(p)) || has_disabled_purchase(&lower) {
        return Availability::OutOfStock;
    }
    if POSITIVE_PHRASES.iter().any(|p| lower.contains(p)) || re_quantity_left().is_match(&lower) {
        return Availability::InStock;
    }
    Availability::Unknown
}

fn has_disabled_purchase(markup: &str) -> bool {
    re_opening_tag().captures_iter(markup).any(|caps| {
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        let inner = caps.get(2).map_or("", |m| m.as_str());
        re_disabled_attr().is_match(attrs)
            && PURCHASE_HINTS
                .iter()
                .any(|h| attrs.contains(h) || inner.contains(h))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_beats_earlier_positive() {
        let s = "<button>Add to cart</button> <p class='stock'>Out of stock</p>";
        assert_eq!(classify_stock_text(s), Availability::OutOfStock);
    }

    #[test]
    fn css_classes_and_localized_phrases() {
        assert_eq!(
            classify_stock_text(r#"<p class="stock out-of-stock"></p>"#),
            Availability::OutOfStock
        );
        assert_eq!(classify_stock_text("غير متوفر"), Availability::OutOfStock);
        assert_eq!(classify_stock_text("متوفر في المخزون"), Availability::InStock);
        assert_eq!(classify_stock_text("Builds Only"), Availability::InStock);
    }

    #[test]
    fn disabled_purchase_button_is_negative() {
        let s = r#"<button type="submit" class="single_add_to_cart_button" disabled>Add to cart</button>"#;
        assert_eq!(classify_stock_text(s), Availability::OutOfStock);
        let enabled = r#"<button class="single_add_to_cart_button">Add to cart</button>"#;
        assert_eq!(classify_stock_text(enabled), Availability::InStock);
    }

    #[test]
    fn quantity_messages() {
        assert_eq!(classify_stock_text("Hurry, only 3 left!"), Availability::InStock);
        assert_eq!(classify_stock_text("2 left in stock"), Availability::InStock);
    }

    #[test]
    fn nothing_recognized_is_unknown() {
        assert_eq!(classify_stock_text("Check site"), Availability::Unknown);
        assert_eq!(classify_stock_text(""), Availability::Unknown);
        assert_eq!(classify_stock_text("<div><span"), Availability::Unknown);
    }

    #[test]
    fn quantities_and_missing() {
        assert_eq!(classify_stock(&RawStock::Quantity(4)), Availability::InStock);
        assert_eq!(classify_stock(&RawStock::Quantity(0)), Availability::OutOfStock);
        assert_eq!(classify_stock(&RawStock::Missing), Availability::Unknown);
    }
}
