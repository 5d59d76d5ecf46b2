//! Options envelopes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sensitivities reported for a contract. Providers that do not compute
/// greeks leave every field empty.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OptionGreeks {
    /// Delta.
    pub delta: Option<f64>,
    /// Gamma.
    pub gamma: Option<f64>,
    /// Theta (per day).
    pub theta: Option<f64>,
    /// Vega (per vol point).
    pub vega: Option<f64>,
    /// Rho.
    pub rho: Option<f64>,
}

/// One row of an option chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRow {
    /// OCC-style contract symbol.
    pub contract_symbol: String,
    /// Strike price.
    pub strike: Decimal,
    /// Best bid.
    pub bid: Option<Decimal>,
    /// Best ask.
    pub ask: Option<Decimal>,
    /// Last trade.
    pub last: Option<Decimal>,
    /// Session volume.
    pub volume: Option<u64>,
    /// Open interest.
    pub open_interest: Option<u64>,
    /// Implied volatility as a fraction.
    pub implied_volatility: Option<f64>,
    /// Whether the contract is in the money.
    pub in_the_money: bool,
    /// Greeks snapshot.
    pub greeks: OptionGreeks,
}

/// Option chain for a single expiry; rows are ordered by ascending strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsChain {
    /// Underlying symbol.
    pub symbol: String,
    /// Expiration date of every row.
    pub expiry: NaiveDate,
    /// Underlying price at snapshot time.
    pub underlying_price: Option<Decimal>,
    /// Call rows.
    pub calls: Vec<OptionRow>,
    /// Put rows.
    pub puts: Vec<OptionRow>,
    /// Name of the provider that produced this envelope.
    pub source: String,
}

/// Listed expirations for an underlying, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsExpirations {
    /// Underlying symbol.
    pub symbol: String,
    /// Expiration dates.
    pub expirations: Vec<NaiveDate>,
    /// Name of the provider that produced this envelope.
    pub source: String,
}
