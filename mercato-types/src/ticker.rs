//! Flattened, legacy-compatible view combining quote, profile and fundamentals.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::company::{CompanyInfo, Fundamentals};
use crate::data_type::DataType;
use crate::market::Quote;

/// Every quote, info and fundamentals field for one symbol, merged into a
/// single record. Parts that could not be fetched leave their fields empty;
/// `sources` names the provider behind each part that was filled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TickerData {
    /// Upper-cased ticker symbol.
    pub symbol: String,

    // quote
    /// Last traded price.
    pub price: Option<Decimal>,
    /// Previous session close.
    pub previous_close: Option<Decimal>,
    /// Change against previous close.
    pub change: Option<Decimal>,
    /// Percent change against previous close.
    pub change_percent: Option<Decimal>,
    /// Session open.
    pub open: Option<Decimal>,
    /// Session high.
    pub day_high: Option<Decimal>,
    /// Session low.
    pub day_low: Option<Decimal>,
    /// Session volume.
    pub volume: Option<u64>,
    /// Quote timestamp.
    pub as_of: Option<DateTime<Utc>>,

    // info
    /// Display name.
    pub name: Option<String>,
    /// Listing exchange.
    pub exchange: Option<String>,
    /// Currency (quote currency preferred over profile currency).
    pub currency: Option<String>,
    /// Sector.
    pub sector: Option<String>,
    /// Industry.
    pub industry: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Website.
    pub website: Option<String>,
    /// Business summary.
    pub description: Option<String>,
    /// Employees.
    pub employees: Option<u64>,
    /// Market capitalisation.
    pub market_cap: Option<Decimal>,

    // fundamentals
    /// Trailing P/E.
    pub pe_ratio: Option<f64>,
    /// Forward P/E.
    pub forward_pe: Option<f64>,
    /// PEG.
    pub peg_ratio: Option<f64>,
    /// Price/book.
    pub price_to_book: Option<f64>,
    /// Trailing EPS.
    pub eps: Option<Decimal>,
    /// Dividend yield.
    pub dividend_yield: Option<f64>,
    /// Beta.
    pub beta: Option<f64>,
    /// Profit margin.
    pub profit_margin: Option<f64>,
    /// Return on equity.
    pub return_on_equity: Option<f64>,
    /// Debt/equity.
    pub debt_to_equity: Option<f64>,
    /// Revenue.
    pub revenue: Option<Decimal>,
    /// 52-week high.
    pub fifty_two_week_high: Option<Decimal>,
    /// 52-week low.
    pub fifty_two_week_low: Option<Decimal>,

    /// Provider behind each merged part.
    pub sources: BTreeMap<DataType, String>,
}

impl TickerData {
    /// Merge whichever parts are available into one record.
    #[must_use]
    pub fn merge(
        symbol: impl Into<String>,
        quote: Option<&Quote>,
        info: Option<&CompanyInfo>,
        fundamentals: Option<&Fundamentals>,
    ) -> Self {
        let mut out = Self {
            symbol: symbol.into(),
            ..Self::default()
        };

        if let Some(q) = quote {
            out.price = Some(q.price);
            out.previous_close = q.previous_close;
            out.change = q.change();
            out.change_percent = q.change_percent();
            out.open = q.open;
            out.day_high = q.day_high;
            out.day_low = q.day_low;
            out.volume = q.volume;
            out.as_of = Some(q.as_of);
            out.currency.clone_from(&q.currency);
            out.sources.insert(DataType::Quote, q.source.clone());
        }

        if let Some(i) = info {
            out.name.clone_from(&i.name);
            out.exchange.clone_from(&i.exchange);
            if out.currency.is_none() {
                out.currency.clone_from(&i.currency);
            }
            out.sector.clone_from(&i.sector);
            out.industry.clone_from(&i.industry);
            out.country.clone_from(&i.country);
            out.website.clone_from(&i.website);
            out.description.clone_from(&i.description);
            out.employees = i.employees;
            out.market_cap = i.market_cap;
            out.sources.insert(DataType::Info, i.source.clone());
        }

        if let Some(f) = fundamentals {
            out.pe_ratio = f.pe_ratio;
            out.forward_pe = f.forward_pe;
            out.peg_ratio = f.peg_ratio;
            out.price_to_book = f.price_to_book;
            out.eps = f.eps;
            out.dividend_yield = f.dividend_yield;
            out.beta = f.beta;
            out.profit_margin = f.profit_margin;
            out.return_on_equity = f.return_on_equity;
            out.debt_to_equity = f.debt_to_equity;
            out.revenue = f.revenue;
            out.fifty_two_week_high = f.fifty_two_week_high;
            out.fifty_two_week_low = f.fifty_two_week_low;
            out.sources.insert(DataType::Fundamentals, f.source.clone());
        }

        out
    }

    /// True when no part could be merged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
