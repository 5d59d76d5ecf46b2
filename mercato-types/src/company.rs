//! Company-level envelopes: profile, fundamentals and earnings.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Company profile information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    /// Upper-cased ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: Option<String>,
    /// Listing exchange.
    pub exchange: Option<String>,
    /// Reporting currency.
    pub currency: Option<String>,
    /// Sector classification.
    pub sector: Option<String>,
    /// Industry classification.
    pub industry: Option<String>,
    /// Country of domicile.
    pub country: Option<String>,
    /// Corporate website.
    pub website: Option<String>,
    /// Long business summary.
    pub description: Option<String>,
    /// Full-time employees.
    pub employees: Option<u64>,
    /// Market capitalisation.
    pub market_cap: Option<Decimal>,
    /// Name of the provider that produced this envelope.
    pub source: String,
}

/// Valuation ratios and headline fundamentals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    /// Upper-cased ticker symbol.
    pub symbol: String,
    /// Trailing price/earnings.
    pub pe_ratio: Option<f64>,
    /// Forward price/earnings.
    pub forward_pe: Option<f64>,
    /// Price/earnings-to-growth.
    pub peg_ratio: Option<f64>,
    /// Price/book.
    pub price_to_book: Option<f64>,
    /// Trailing earnings per share.
    pub eps: Option<Decimal>,
    /// Dividend yield as a fraction (0.005 = 0.5%).
    pub dividend_yield: Option<f64>,
    /// Beta against the provider's benchmark.
    pub beta: Option<f64>,
    /// Net profit margin as a fraction.
    pub profit_margin: Option<f64>,
    /// Return on equity as a fraction.
    pub return_on_equity: Option<f64>,
    /// Debt/equity.
    pub debt_to_equity: Option<f64>,
    /// Trailing revenue.
    pub revenue: Option<Decimal>,
    /// 52-week high.
    pub fifty_two_week_high: Option<Decimal>,
    /// 52-week low.
    pub fifty_two_week_low: Option<Decimal>,
    /// Name of the provider that produced this envelope.
    pub source: String,
}

/// One reported (or scheduled) earnings event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsEvent {
    /// Report date.
    pub date: NaiveDate,
    /// Consensus EPS estimate.
    pub eps_estimate: Option<Decimal>,
    /// Reported EPS; `None` for future events.
    pub eps_actual: Option<Decimal>,
    /// Surprise versus estimate, in percent.
    pub surprise_percent: Option<f64>,
}

/// Earnings calendar and history for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Earnings {
    /// Upper-cased ticker symbol.
    pub symbol: String,
    /// Next scheduled report date.
    pub next_date: Option<NaiveDate>,
    /// Past events, most recent first.
    pub history: Vec<EarningsEvent>,
    /// Name of the provider that produced this envelope.
    pub source: String,
}
