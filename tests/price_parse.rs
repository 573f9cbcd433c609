// tests/price_parse.rs
use price_aggregator::listing::{RawListing, RawPrice, RawStock};
use price_aggregator::normalize::{normalize_batch, parse_price, parse_price_value};

#[test]
fn common_formats_and_sentinels() {
    assert_eq!(parse_price("31.999,00"), Some(31_999));
    assert_eq!(parse_price("1,234.56"), Some(1_235));
    assert_eq!(parse_price("1234"), Some(1_234));
    assert_eq!(parse_price("EGP 0"), None);
    assert_eq!(parse_price("1"), None);
}

#[test]
fn european_format_rounds_to_nearest_unit() {
    for (thousands, hundreds, cents) in [(1u64, 0u64, 0u64), (12, 345, 49), (31, 999, 50), (7, 5, 99)] {
        let text = format!("{thousands}.{hundreds:03},{cents:02}");
        let exact = (thousands * 1_000 + hundreds) as f64 + cents as f64 / 100.0;
        assert_eq!(parse_price(&text), Some(exact.round() as u64), "{text}");
    }
}

#[test]
fn markup_and_currency_noise() {
    assert_eq!(
        parse_price(r#"<span class="woocommerce-Price-amount"><bdi>13,750.00&nbsp;<span>EGP</span></bdi></span>"#),
        Some(13_750)
    );
    assert_eq!(parse_price("ج.م 8.499"), Some(8_499));
    assert_eq!(parse_price("Price on request"), None);
}

#[test]
fn numeric_prices_pass_through() {
    assert_eq!(parse_price_value(&RawPrice::Number(4_199.6)), Some(4_200));
    assert_eq!(parse_price_value(&RawPrice::Number(0.0)), None);
    assert_eq!(parse_price_value(&RawPrice::Number(f64::NAN)), None);
}

#[test]
fn a_bad_price_drops_only_that_listing() {
    let raws = vec![
        RawListing::new("S", "Good one", "/a", "2,500 EGP", RawStock::Missing),
        RawListing::new("S", "Call us", "/b", "call for price", RawStock::Missing),
        RawListing::new("S", "Placeholder", "/c", "1", RawStock::Missing),
        RawListing::new("S", "Another", "/d", 3_100.0, RawStock::Missing),
    ];
    let (kept, dropped) = normalize_batch(raws);
    assert_eq!(dropped, 2);
    let names: Vec<_> = kept.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Good one", "Another"]);
}
