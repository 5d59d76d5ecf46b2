use core::fmt;
use core::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::MercatoError;

/// Closed set of market data categories served by the engine.
///
/// The data type selects which adapters are eligible, which cache TTL applies
/// and how metrics are bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Point-in-time quote.
    Quote,
    /// Historical OHLCV bars.
    History,
    /// Company profile information.
    Info,
    /// Valuation ratios and fundamentals.
    Fundamentals,
    /// Option chain for a single expiry.
    OptionsChain,
    /// Listed option expirations.
    OptionsExpirations,
    /// Earnings calendar and history.
    Earnings,
    /// Macroeconomic series.
    Macro,
}

impl DataType {
    /// Every data type, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Quote,
        Self::History,
        Self::Info,
        Self::Fundamentals,
        Self::OptionsChain,
        Self::OptionsExpirations,
        Self::Earnings,
        Self::Macro,
    ];

    /// Stable, snake_case identifier for logs, keys and config.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::History => "history",
            Self::Info => "info",
            Self::Fundamentals => "fundamentals",
            Self::OptionsChain => "options_chain",
            Self::OptionsExpirations => "options_expirations",
            Self::Earnings => "earnings",
            Self::Macro => "macro",
        }
    }

    /// The single-bit set for this data type.
    #[must_use]
    pub const fn flag(self) -> DataTypes {
        match self {
            Self::Quote => DataTypes::QUOTE,
            Self::History => DataTypes::HISTORY,
            Self::Info => DataTypes::INFO,
            Self::Fundamentals => DataTypes::FUNDAMENTALS,
            Self::OptionsChain => DataTypes::OPTIONS_CHAIN,
            Self::OptionsExpirations => DataTypes::OPTIONS_EXPIRATIONS,
            Self::Earnings => DataTypes::EARNINGS,
            Self::Macro => DataTypes::MACRO,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = MercatoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MercatoError::InvalidArg(format!("unknown data type: {s}")))
    }
}

bitflags! {
    /// Compact set of [`DataType`]s, used to declare adapter coverage.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DataTypes: u16 {
        /// [`DataType::Quote`]
        const QUOTE = 1 << 0;
        /// [`DataType::History`]
        const HISTORY = 1 << 1;
        /// [`DataType::Info`]
        const INFO = 1 << 2;
        /// [`DataType::Fundamentals`]
        const FUNDAMENTALS = 1 << 3;
        /// [`DataType::OptionsChain`]
        const OPTIONS_CHAIN = 1 << 4;
        /// [`DataType::OptionsExpirations`]
        const OPTIONS_EXPIRATIONS = 1 << 5;
        /// [`DataType::Earnings`]
        const EARNINGS = 1 << 6;
        /// [`DataType::Macro`]
        const MACRO = 1 << 7;
    }
}

impl DataTypes {
    /// Whether the set contains `data_type`.
    #[must_use]
    pub const fn has(self, data_type: DataType) -> bool {
        self.contains(data_type.flag())
    }

    /// Iterate the contained data types in declaration order.
    pub fn data_types(self) -> impl Iterator<Item = DataType> {
        DataType::ALL.into_iter().filter(move |d| self.has(*d))
    }
}

impl From<DataType> for DataTypes {
    fn from(d: DataType) -> Self {
        d.flag()
    }
}

impl FromIterator<DataType> for DataTypes {
    fn from_iter<I: IntoIterator<Item = DataType>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |acc, d| acc | d.flag())
    }
}
