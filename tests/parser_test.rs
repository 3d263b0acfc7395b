//! View-count parsing and earnings properties

use clipfund::earnings::{earnings, to_money};
use clipfund::parser::parse_view_count;
use rust_decimal::Decimal;

#[test]
fn test_parse_abbreviated_millions() {
    assert_eq!(parse_view_count("1.2M"), 1_200_000);
}

#[test]
fn test_parse_comma_grouped() {
    assert_eq!(parse_view_count("822,000"), 822_000);
}

#[test]
fn test_parse_abbreviated_thousands() {
    assert_eq!(parse_view_count("15K"), 15_000);
}

#[test]
fn test_parse_empty_is_zero() {
    assert_eq!(parse_view_count(""), 0);
}

#[test]
fn test_parse_garbage_is_zero() {
    assert_eq!(parse_view_count("garbage"), 0);
}

#[test]
fn test_parse_never_panics_on_unicode() {
    assert_eq!(parse_view_count("조회수 1,234회"), 1_234);
    assert_eq!(parse_view_count("★"), 0);
}

#[test]
fn test_earnings_cpm() {
    let cpm: Decimal = "0.03".parse().unwrap();
    assert_eq!(earnings(10_000, cpm), "0.30".parse::<Decimal>().unwrap());
}

#[test]
fn test_earnings_rounds_at_persistence_boundary() {
    let cpm: Decimal = "0.03".parse().unwrap();
    // 12,345 views: 0.37035 exact, 0.37 as money
    assert_eq!(
        to_money(earnings(12_345, cpm)),
        "0.37".parse::<Decimal>().unwrap()
    );
}
