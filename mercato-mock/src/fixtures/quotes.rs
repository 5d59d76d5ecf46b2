use chrono::{DateTime, NaiveDate, Utc};
use mercato_core::Quote;
use rust_decimal::Decimal;

pub fn by_symbol(source: &str, s: &str) -> Option<Quote> {
    match s {
        "AAPL" => q(source, "AAPL", 15_000, 14_850, 52_000_000),
        "MSFT" => q(source, "MSFT", 42_000, 41_800, 21_000_000),
        "TSLA" => q(source, "TSLA", 24_500, 25_010, 98_000_000),
        "NVDA" => q(source, "NVDA", 100_000, 99_000, 40_000_000),
        "XYZ" => q(source, "XYZ", 6_125, 6_000, 3_500_000),
        _ => None,
    }
}

/// Prices are in cents.
fn q(source: &str, sym: &str, px: i64, prev: i64, volume: u64) -> Option<Quote> {
    let as_of: DateTime<Utc> = NaiveDate::from_ymd_opt(2024, 3, 1)?
        .and_hms_opt(20, 0, 0)?
        .and_utc();
    Some(Quote {
        symbol: sym.to_string(),
        price: Decimal::new(px, 2),
        previous_close: Some(Decimal::new(prev, 2)),
        open: Some(Decimal::new(prev, 2)),
        day_high: Some(Decimal::new(px.max(prev) + 100, 2)),
        day_low: Some(Decimal::new(px.min(prev) - 100, 2)),
        volume: Some(volume),
        currency: Some("USD".to_string()),
        as_of,
        source: source.to_string(),
    })
}
