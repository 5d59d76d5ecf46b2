//! Request descriptors, composite keys and the `MarketData` sum type.

use core::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::company::{CompanyInfo, Earnings, Fundamentals};
use crate::data_type::DataType;
use crate::error::MercatoError;
use crate::macro_series::MacroSeries;
use crate::market::{History, HistoryQuery, Quote};
use crate::options::{OptionsChain, OptionsExpirations};

/// A single logical market data request.
///
/// Symbols are normalized (trimmed, upper-cased) by [`DataRequest::normalized`];
/// the service always normalizes before building keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "data_type", rename_all = "snake_case")]
pub enum DataRequest {
    /// Quote for a symbol.
    Quote {
        /// Ticker symbol.
        symbol: String,
    },
    /// History for a symbol.
    History {
        /// Ticker symbol.
        symbol: String,
        /// Window and cadence.
        query: HistoryQuery,
    },
    /// Company profile.
    Info {
        /// Ticker symbol.
        symbol: String,
    },
    /// Fundamentals.
    Fundamentals {
        /// Ticker symbol.
        symbol: String,
    },
    /// Option chain for one expiry.
    OptionsChain {
        /// Underlying symbol.
        symbol: String,
        /// Expiration date.
        expiry: NaiveDate,
    },
    /// Listed option expirations.
    OptionsExpirations {
        /// Underlying symbol.
        symbol: String,
    },
    /// Earnings calendar and history.
    Earnings {
        /// Ticker symbol.
        symbol: String,
    },
    /// Macro series.
    Macro {
        /// Series identifier.
        series_id: String,
    },
}

impl DataRequest {
    /// The data type this request fetches.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Quote { .. } => DataType::Quote,
            Self::History { .. } => DataType::History,
            Self::Info { .. } => DataType::Info,
            Self::Fundamentals { .. } => DataType::Fundamentals,
            Self::OptionsChain { .. } => DataType::OptionsChain,
            Self::OptionsExpirations { .. } => DataType::OptionsExpirations,
            Self::Earnings { .. } => DataType::Earnings,
            Self::Macro { .. } => DataType::Macro,
        }
    }

    /// The symbol (or series id for macro requests).
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Quote { symbol }
            | Self::History { symbol, .. }
            | Self::Info { symbol }
            | Self::Fundamentals { symbol }
            | Self::OptionsChain { symbol, .. }
            | Self::OptionsExpirations { symbol }
            | Self::Earnings { symbol } => symbol,
            Self::Macro { series_id } => series_id,
        }
    }

    /// Return a copy whose symbol is trimmed and upper-cased.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the symbol is empty after trimming.
    pub fn normalized(&self) -> Result<Self, MercatoError> {
        let sym = self.symbol().trim().to_ascii_uppercase();
        if sym.is_empty() {
            return Err(MercatoError::InvalidArg(format!(
                "empty symbol for {} request",
                self.data_type()
            )));
        }
        let mut out = self.clone();
        match &mut out {
            Self::Quote { symbol }
            | Self::History { symbol, .. }
            | Self::Info { symbol }
            | Self::Fundamentals { symbol }
            | Self::OptionsChain { symbol, .. }
            | Self::OptionsExpirations { symbol }
            | Self::Earnings { symbol } => *symbol = sym,
            Self::Macro { series_id } => *series_id = sym,
        }
        Ok(out)
    }

    /// Disambiguating parameters beyond the symbol, rendered canonically.
    #[must_use]
    pub fn params(&self) -> Option<String> {
        match self {
            Self::History { query, .. } => Some(query.to_string()),
            Self::OptionsChain { expiry, .. } => Some(expiry.format("%Y-%m-%d").to_string()),
            _ => None,
        }
    }

    /// Composite cache/dedup key for this request.
    #[must_use]
    pub fn key(&self) -> RequestKey {
        RequestKey {
            data_type: self.data_type(),
            symbol: self.symbol().to_string(),
            params: self.params(),
        }
    }

    /// Noun phrase for not-found messages, e.g. "quote for AAPL".
    #[must_use]
    pub fn describe(&self) -> String {
        match self.params() {
            Some(p) => format!("{} for {} ({p})", self.data_type(), self.symbol()),
            None => format!("{} for {}", self.data_type(), self.symbol()),
        }
    }
}

/// Deterministic composite key of (data type, symbol, parameters).
///
/// Used verbatim for both the cache and the in-flight deduplicator, so the two
/// always agree on what "the same request" means.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    /// Data type.
    pub data_type: DataType,
    /// Normalized symbol.
    pub symbol: String,
    /// Canonical parameter string (period, expiry, ...).
    pub params: Option<String>,
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.params {
            Some(p) => write!(f, "{}:{}:{p}", self.data_type, self.symbol),
            None => write!(f, "{}:{}", self.data_type, self.symbol),
        }
    }
}

/// Any result envelope produced by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "data_type", content = "value", rename_all = "snake_case")]
pub enum MarketData {
    /// Quote envelope.
    Quote(Quote),
    /// History envelope.
    History(History),
    /// Company profile envelope.
    Info(CompanyInfo),
    /// Fundamentals envelope.
    Fundamentals(Fundamentals),
    /// Option chain envelope.
    OptionsChain(OptionsChain),
    /// Expirations envelope.
    OptionsExpirations(OptionsExpirations),
    /// Earnings envelope.
    Earnings(Earnings),
    /// Macro series envelope.
    Macro(MacroSeries),
}

impl MarketData {
    /// The data type of the contained envelope.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Quote(_) => DataType::Quote,
            Self::History(_) => DataType::History,
            Self::Info(_) => DataType::Info,
            Self::Fundamentals(_) => DataType::Fundamentals,
            Self::OptionsChain(_) => DataType::OptionsChain,
            Self::OptionsExpirations(_) => DataType::OptionsExpirations,
            Self::Earnings(_) => DataType::Earnings,
            Self::Macro(_) => DataType::Macro,
        }
    }

    /// Provider that produced the envelope.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Quote(v) => &v.source,
            Self::History(v) => &v.source,
            Self::Info(v) => &v.source,
            Self::Fundamentals(v) => &v.source,
            Self::OptionsChain(v) => &v.source,
            Self::OptionsExpirations(v) => &v.source,
            Self::Earnings(v) => &v.source,
            Self::Macro(v) => &v.source,
        }
    }

    /// Replace the provider attribution.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        let source = source.into();
        match &mut self {
            Self::Quote(v) => v.source = source,
            Self::History(v) => v.source = source,
            Self::Info(v) => v.source = source,
            Self::Fundamentals(v) => v.source = source,
            Self::OptionsChain(v) => v.source = source,
            Self::OptionsExpirations(v) => v.source = source,
            Self::Earnings(v) => v.source = source,
            Self::Macro(v) => v.source = source,
        }
        self
    }
}

macro_rules! market_data_variant {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for MarketData {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        }

        impl TryFrom<MarketData> for $ty {
            type Error = MercatoError;

            fn try_from(value: MarketData) -> Result<Self, Self::Error> {
                match value {
                    MarketData::$variant(v) => Ok(v),
                    other => Err(MercatoError::Data(format!(
                        concat!("expected ", stringify!($variant), " envelope, got {}"),
                        other.data_type()
                    ))),
                }
            }
        }
    };
}

market_data_variant!(Quote, Quote);
market_data_variant!(History, History);
market_data_variant!(Info, CompanyInfo);
market_data_variant!(Fundamentals, Fundamentals);
market_data_variant!(OptionsChain, OptionsChain);
market_data_variant!(OptionsExpirations, OptionsExpirations);
market_data_variant!(Earnings, Earnings);
market_data_variant!(Macro, MacroSeries);
