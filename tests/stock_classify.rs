// tests/stock_classify.rs
use price_aggregator::listing::{Availability, RawStock};
use price_aggregator::normalize::{classify_stock, classify_stock_text};

#[test]
fn negative_phrase_wins_wherever_it_appears() {
    let positives = ["add to cart", "in stock", "available", "only 2 left"];
    let negatives = ["out of stock", "sold out", "غير متوفر"];
    for p in positives {
        for n in negatives {
            let text = format!("<p>{p}</p> <span>{n}</span>");
            assert_eq!(classify_stock_text(&text), Availability::OutOfStock, "{text}");
        }
    }
}

#[test]
fn negated_in_stock_phrases_are_out_of_stock() {
    for s in ["Not in stock", "NOT-IN-STOCK", "No stock", "<span>currently not in stock</span>"] {
        assert_eq!(classify_stock_text(s), Availability::OutOfStock, "{s:?}");
    }
}

#[test]
fn disabled_purchase_button_is_negative() {
    let html = r#"<button type="submit" class="single_add_to_cart_button" disabled>Add to cart</button>"#;
    assert_eq!(classify_stock_text(html), Availability::OutOfStock);

    let enabled = r#"<button type="submit" class="single_add_to_cart_button">Add to cart</button>"#;
    assert_eq!(classify_stock_text(enabled), Availability::InStock);
}

#[test]
fn positive_signals() {
    assert_eq!(classify_stock_text("In Stock"), Availability::InStock);
    assert_eq!(classify_stock_text("Only 3 left"), Availability::InStock);
    assert_eq!(classify_stock_text("متوفر"), Availability::InStock);
}

#[test]
fn no_signal_is_unknown_never_panics() {
    for s in ["", "   ", "<div class=", "Ships in 3-5 days", "<<<>>>"] {
        assert_eq!(classify_stock_text(s), Availability::Unknown, "{s:?}");
    }
}

#[test]
fn quantities() {
    assert_eq!(classify_stock(&RawStock::Quantity(4)), Availability::InStock);
    assert_eq!(classify_stock(&RawStock::Quantity(0)), Availability::OutOfStock);
    assert_eq!(classify_stock(&RawStock::Missing), Availability::Unknown);
}
