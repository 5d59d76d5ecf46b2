use mercato_core::{Bar, BarInterval, History};
use rust_decimal::Decimal;

use super::midnight;

pub fn by_symbol(source: &str, s: &str, interval: BarInterval) -> Option<History> {
    let rows: &[(u32, i64, i64, i64, i64, u64)] = match s {
        "AAPL" => &[
            (2, 14_000, 14_200, 13_900, 14_100, 10_000_000),
            (3, 14_100, 14_300, 14_000, 14_200, 11_000_000),
            (4, 14_200, 14_350, 14_150, 14_300, 9_000_000),
        ],
        "MSFT" => &[
            (2, 24_000, 24_500, 23_800, 24_400, 9_000_000),
            (3, 24_400, 24_600, 24_300, 24_500, 9_500_000),
        ],
        "TSLA" => &[
            (2, 30_000, 31_000, 29_500, 30_500, 8_000_000),
            (3, 30_500, 31_500, 30_000, 31_200, 8_500_000),
        ],
        _ => return None,
    };
    let mut bars = Vec::with_capacity(rows.len());
    for &(day, o, h, l, c, v) in rows {
        bars.push(Bar {
            ts: midnight(2023, 1, day)?,
            open: Decimal::new(o, 2),
            high: Decimal::new(h, 2),
            low: Decimal::new(l, 2),
            close: Decimal::new(c, 2),
            volume: Some(v),
        });
    }
    Some(History {
        symbol: s.to_string(),
        interval,
        bars,
        source: source.to_string(),
    })
}
