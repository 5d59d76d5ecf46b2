//! Price envelopes: quotes and historical bars.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MercatoError;

/// Point-in-time quote for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Upper-cased ticker symbol.
    pub symbol: String,
    /// Last traded price.
    pub price: Decimal,
    /// Previous session close.
    pub previous_close: Option<Decimal>,
    /// Session open.
    pub open: Option<Decimal>,
    /// Session high.
    pub day_high: Option<Decimal>,
    /// Session low.
    pub day_low: Option<Decimal>,
    /// Session volume.
    pub volume: Option<u64>,
    /// ISO currency code, when the provider reports one.
    pub currency: Option<String>,
    /// Provider timestamp of the quote.
    pub as_of: DateTime<Utc>,
    /// Name of the provider that produced this envelope.
    pub source: String,
}

impl Quote {
    /// Absolute change against the previous close.
    #[must_use]
    pub fn change(&self) -> Option<Decimal> {
        self.previous_close.map(|pc| self.price - pc)
    }

    /// Percentage change against the previous close.
    #[must_use]
    pub fn change_percent(&self) -> Option<Decimal> {
        let pc = self.previous_close?;
        if pc.is_zero() {
            return None;
        }
        Some((self.price - pc) / pc * Decimal::ONE_HUNDRED)
    }
}

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time.
    pub ts: DateTime<Utc>,
    /// Open price.
    pub open: Decimal,
    /// High price.
    pub high: Decimal,
    /// Low price.
    pub low: Decimal,
    /// Close price.
    pub close: Decimal,
    /// Traded volume.
    pub volume: Option<u64>,
}

/// Historical bars for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Upper-cased ticker symbol.
    pub symbol: String,
    /// Bar cadence.
    pub interval: BarInterval,
    /// Bars in ascending time order.
    pub bars: Vec<Bar>,
    /// Name of the provider that produced this envelope.
    pub source: String,
}

/// Lookback window accepted by history requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPeriod {
    /// One day.
    D1,
    /// Five days.
    D5,
    /// One month.
    M1,
    /// Three months.
    M3,
    /// Six months.
    M6,
    /// One year.
    Y1,
    /// Two years.
    Y2,
    /// Five years.
    Y5,
    /// Everything available.
    Max,
}

impl HistoryPeriod {
    /// Provider-style label (`1d`, `6mo`, `max`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::D1 => "1d",
            Self::D5 => "5d",
            Self::M1 => "1mo",
            Self::M3 => "3mo",
            Self::M6 => "6mo",
            Self::Y1 => "1y",
            Self::Y2 => "2y",
            Self::Y5 => "5y",
            Self::Max => "max",
        }
    }
}

impl FromStr for HistoryPeriod {
    type Err = MercatoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let p = match s.trim().to_ascii_lowercase().as_str() {
            "1d" => Self::D1,
            "5d" => Self::D5,
            "1mo" => Self::M1,
            "3mo" => Self::M3,
            "6mo" => Self::M6,
            "1y" => Self::Y1,
            "2y" => Self::Y2,
            "5y" => Self::Y5,
            "max" => Self::Max,
            other => return Err(MercatoError::InvalidArg(format!("unknown period: {other}"))),
        };
        Ok(p)
    }
}

/// Bar cadence accepted by history requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarInterval {
    /// One minute.
    M1,
    /// Five minutes.
    M5,
    /// Fifteen minutes.
    M15,
    /// One hour.
    H1,
    /// One day.
    #[default]
    D1,
    /// One week.
    W1,
    /// One month.
    Mo1,
}

impl BarInterval {
    /// Provider-style label (`1m`, `1h`, `1d`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::D1 => "1d",
            Self::W1 => "1wk",
            Self::Mo1 => "1mo",
        }
    }
}

/// Window selector for a history request: a named period or explicit dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryWindow {
    /// Named lookback ending now.
    Period(HistoryPeriod),
    /// Inclusive calendar range.
    Range {
        /// First day included.
        start: NaiveDate,
        /// Last day included.
        end: NaiveDate,
    },
}

/// Parameters of a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Lookback window.
    pub window: HistoryWindow,
    /// Bar cadence.
    pub interval: BarInterval,
}

impl HistoryQuery {
    /// Query a named period at the given cadence.
    #[must_use]
    pub const fn period(period: HistoryPeriod, interval: BarInterval) -> Self {
        Self {
            window: HistoryWindow::Period(period),
            interval,
        }
    }

    /// Query an explicit date range at the given cadence.
    ///
    /// # Errors
    /// Returns `InvalidArg` when `start` is after `end`.
    pub fn range(
        start: NaiveDate,
        end: NaiveDate,
        interval: BarInterval,
    ) -> Result<Self, MercatoError> {
        if start > end {
            return Err(MercatoError::InvalidArg(format!(
                "history range start {start} is after end {end}"
            )));
        }
        Ok(Self {
            window: HistoryWindow::Range { start, end },
            interval,
        })
    }
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self::period(HistoryPeriod::Y1, BarInterval::D1)
    }
}

impl fmt::Display for HistoryQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.window {
            HistoryWindow::Period(p) => write!(f, "{}:{}", p.as_str(), self.interval.as_str()),
            HistoryWindow::Range { start, end } => {
                write!(f, "{start}..{end}:{}", self.interval.as_str())
            }
        }
    }
}
