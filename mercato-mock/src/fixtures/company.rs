use mercato_core::{CompanyInfo, Earnings, EarningsEvent, Fundamentals};
use rust_decimal::Decimal;

use super::date;

pub fn info(source: &str, s: &str) -> Option<CompanyInfo> {
    let (name, sector, industry, employees, cap_bn) = match s {
        "AAPL" => ("Apple Inc.", "Technology", "Consumer Electronics", 161_000, 2_900),
        "MSFT" => ("Microsoft Corp", "Technology", "Software", 221_000, 3_100),
        "TSLA" => ("Tesla, Inc.", "Consumer Cyclical", "Auto Manufacturers", 140_000, 780),
        _ => return None,
    };
    Some(CompanyInfo {
        symbol: s.to_string(),
        name: Some(name.to_string()),
        exchange: Some("NASDAQ".to_string()),
        currency: Some("USD".to_string()),
        sector: Some(sector.to_string()),
        industry: Some(industry.to_string()),
        country: Some("United States".to_string()),
        website: None,
        description: None,
        employees: Some(employees),
        market_cap: Some(Decimal::from(cap_bn) * Decimal::from(1_000_000_000u64)),
        source: source.to_string(),
    })
}

pub fn fundamentals(source: &str, s: &str) -> Option<Fundamentals> {
    let (pe, eps_cents, beta) = match s {
        "AAPL" => (29.5, 640, 1.28),
        "MSFT" => (36.1, 1_163, 0.89),
        "TSLA" => (61.0, 402, 2.31),
        _ => return None,
    };
    Some(Fundamentals {
        symbol: s.to_string(),
        pe_ratio: Some(pe),
        forward_pe: Some(pe * 0.9),
        peg_ratio: None,
        price_to_book: None,
        eps: Some(Decimal::new(eps_cents, 2)),
        dividend_yield: None,
        beta: Some(beta),
        profit_margin: None,
        return_on_equity: None,
        debt_to_equity: None,
        revenue: None,
        fifty_two_week_high: None,
        fifty_two_week_low: None,
        source: source.to_string(),
    })
}

pub fn earnings(source: &str, s: &str) -> Option<Earnings> {
    if !matches!(s, "AAPL" | "MSFT") {
        return None;
    }
    Some(Earnings {
        symbol: s.to_string(),
        next_date: date(2024, 5, 2),
        history: vec![EarningsEvent {
            date: date(2024, 2, 1)?,
            eps_estimate: Some(Decimal::new(210, 2)),
            eps_actual: Some(Decimal::new(218, 2)),
            surprise_percent: Some(3.8),
        }],
        source: source.to_string(),
    })
}
