use chrono::NaiveDate;
use mercato_core::{OptionGreeks, OptionRow, OptionsChain, OptionsExpirations};
use rust_decimal::Decimal;

use super::date;

pub fn expirations(source: &str, s: &str) -> Option<OptionsExpirations> {
    if !matches!(s, "AAPL" | "XYZ") {
        return None;
    }
    Some(OptionsExpirations {
        symbol: s.to_string(),
        expirations: vec![date(2024, 3, 15)?, date(2024, 4, 19)?],
        source: source.to_string(),
    })
}

pub fn chain(source: &str, s: &str, expiry: NaiveDate) -> Option<OptionsChain> {
    let available = expirations(source, s)?;
    if !available.expirations.contains(&expiry) {
        return None;
    }
    let row = |kind: char, strike: i64, itm: bool| OptionRow {
        contract_symbol: format!("{s}{}{kind}{strike:08}", expiry.format("%y%m%d")),
        strike: Decimal::from(strike),
        bid: Some(Decimal::new(250, 2)),
        ask: Some(Decimal::new(265, 2)),
        last: Some(Decimal::new(255, 2)),
        volume: Some(1_200),
        open_interest: Some(8_400),
        implied_volatility: Some(0.27),
        in_the_money: itm,
        greeks: OptionGreeks::default(),
    };
    Some(OptionsChain {
        symbol: s.to_string(),
        expiry,
        underlying_price: None,
        calls: vec![row('C', 145, true), row('C', 155, false)],
        puts: vec![row('P', 145, false), row('P', 155, true)],
        source: source.to_string(),
    })
}
