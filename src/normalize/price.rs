// src/normalize/price.rs
//! Price text → whole currency units.
//!
//! Two conventions are supported:
//! - [`parse_price_digits`]: keep every digit, ignore everything else.
//! - [`parse_price`]: locale-aware. When both `.` and `,` appear, the one that
//!   comes last is the decimal separator. A lone comma is decimal only when it is
//!   followed by exactly two digits. Lone dots are thousands separators when there
//!   are several of them or when the single dot is followed by exactly three digits.
//!
//! Both return `None` for "no valid price": no digits at all, or a value <= 1,
//! which in this domain's currency is always a scraping artifact.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::listing::RawPrice;

/// Anything at or below this is a sentinel, not a price.
pub const MIN_VALID_PRICE: u64 = 1;

fn re_number() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\d(?:[\d.,]*\d)?").expect("price number regex"))
}

/// Map Arabic-Indic digits and separators onto their ASCII counterparts.
fn fold_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            '\u{066B}' => '.',
            '\u{066C}' => ',',
            other => other,
        })
        .collect()
}

fn accept(v: u64) -> Option<u64> {
    (v > MIN_VALID_PRICE).then_some(v)
}

/// Strip every non-digit and read the rest as one integer.
pub fn parse_price_digits(text: &str) -> Option<u64> {
    let digits: String = fold_digits(text)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u64>().ok().and_then(accept)
}

/// Locale-aware parse of the first number in `text`, rounded to whole units.
pub fn parse_price(text: &str) -> Option<u64> {
    let folded = fold_digits(text);
    let num = re_number().find(&folded)?.as_str();

    let canonical = match (num.rfind('.'), num.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => num.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => num.replace(',', ""),
        (None, Some(comma)) => {
            let single = num.matches(',').count() == 1;
            if single && num.len() - comma - 1 == 2 {
                num.replace(',', ".")
            } else {
                num.replace(',', "")
            }
        }
        (Some(dot), None) => {
            let several = num.matches('.').count() > 1;
            if several || num.len() - dot - 1 == 3 {
                num.replace('.', "")
            } else {
                num.to_string()
            }
        }
        (None, None) => num.to_string(),
    };

    round_units(canonical.parse::<f64>().ok()?)
}

/// Resolve whatever the adapter handed over.
pub fn parse_price_value(raw: &RawPrice) -> Option<u64> {
    match raw {
        RawPrice::Text(s) => parse_price(s),
        RawPrice::Digits(s) => parse_price_digits(s),
        RawPrice::Number(v) => round_units(*v),
    }
}

fn round_units(v: f64) -> Option<u64> {
    if !v.is_finite() || v < 0.0 || v >= u64::MAX as f64 {
        return None;
    }
    accept(v.round() as u64)
}
