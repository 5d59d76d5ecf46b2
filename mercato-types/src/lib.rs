//! mercato-specific data transfer objects and configuration primitives.
#![warn(missing_docs)]

mod company;
mod config;
mod data_type;
mod error;
mod health;
mod macro_series;
mod market;
mod metrics;
mod options;
mod request;
mod ticker;

pub use company::{CompanyInfo, Earnings, EarningsEvent, Fundamentals};
pub use config::{
    CacheConfig, CredentialsConfig, MetricsConfig, NotFoundPolicy, ProviderConfig,
    ResolvedCredentials, ServiceConfig,
};
pub use data_type::{DataType, DataTypes};
pub use error::{FailureKind, MercatoError, collapse_errors};
pub use health::{
    HealthClassification, ProviderHealthSnapshot, ProviderHealthState, ProviderStatus,
};
pub use macro_series::{MacroObservation, MacroSeries};
pub use market::{Bar, BarInterval, History, HistoryPeriod, HistoryQuery, HistoryWindow, Quote};
pub use metrics::{
    CacheStats, CallOutcome, CallRecord, DataTypeStats, LatencyPercentiles, LatencySummary,
    MetricsSnapshot, ProviderAttempt, ProviderStats, StatsSnapshot, TotalStats,
};
pub use options::{OptionGreeks, OptionRow, OptionsChain, OptionsExpirations};
pub use request::{DataRequest, MarketData, RequestKey};
pub use ticker::TickerData;

pub use chrono::{DateTime, NaiveDate, Utc};
pub use rust_decimal::Decimal;
