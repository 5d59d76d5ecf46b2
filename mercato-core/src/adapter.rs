use async_trait::async_trait;

use mercato_types::{
    CompanyInfo, DataRequest, DataType, DataTypes, Earnings, Fundamentals, History, HistoryQuery,
    MacroSeries, MarketData, MercatoError, NaiveDate, OptionsChain, OptionsExpirations, Quote,
};

/// Focused role trait for adapters that provide point-in-time quotes.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch a quote for a normalized symbol.
    async fn quote(&self, symbol: &str) -> Result<Quote, MercatoError>;
}

/// Focused role trait for adapters that provide OHLCV history.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Fetch bars for the window and interval described by `query`.
    async fn history(&self, symbol: &str, query: &HistoryQuery) -> Result<History, MercatoError>;
}

/// Focused role trait for adapters that provide company profiles.
#[async_trait]
pub trait InfoProvider: Send + Sync {
    /// Fetch the company profile for a symbol.
    async fn info(&self, symbol: &str) -> Result<CompanyInfo, MercatoError>;
}

/// Focused role trait for adapters that provide valuation and balance metrics.
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    /// Fetch fundamentals for a symbol.
    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, MercatoError>;
}

/// Focused role trait for adapters that provide option chains.
#[async_trait]
pub trait OptionsChainProvider: Send + Sync {
    /// Fetch calls and puts for one expiry.
    async fn options_chain(
        &self,
        symbol: &str,
        expiry: NaiveDate,
    ) -> Result<OptionsChain, MercatoError>;
}

/// Focused role trait for adapters that list option expirations.
#[async_trait]
pub trait OptionsExpirationsProvider: Send + Sync {
    /// Fetch listed expirations for an underlying.
    async fn options_expirations(&self, symbol: &str) -> Result<OptionsExpirations, MercatoError>;
}

/// Focused role trait for adapters that provide earnings calendars.
#[async_trait]
pub trait EarningsProvider: Send + Sync {
    /// Fetch upcoming and historical earnings for a symbol.
    async fn earnings(&self, symbol: &str) -> Result<Earnings, MercatoError>;
}

/// Focused role trait for adapters that provide macroeconomic series.
#[async_trait]
pub trait MacroProvider: Send + Sync {
    /// Fetch observations for a series id.
    async fn macro_series(&self, series_id: &str) -> Result<MacroSeries, MercatoError>;
}

/// Main adapter trait implemented by provider integrations.
///
/// Adapters advertise each data type they serve by returning a trait object
/// from the matching `as_*_provider` accessor. Every method on a role trait
/// either returns a fully formed envelope or one classified error; adapters
/// never panic on provider failures.
pub trait ProviderAdapter: Send + Sync {
    /// Stable name used for registry lookups, metrics and envelope `source` fields.
    fn name(&self) -> &str;

    /// If implemented, returns a trait object for quotes.
    fn as_quote_provider(&self) -> Option<&dyn QuoteProvider> {
        None
    }
    /// If implemented, returns a trait object for history.
    fn as_history_provider(&self) -> Option<&dyn HistoryProvider> {
        None
    }
    /// If implemented, returns a trait object for company profiles.
    fn as_info_provider(&self) -> Option<&dyn InfoProvider> {
        None
    }
    /// If implemented, returns a trait object for fundamentals.
    fn as_fundamentals_provider(&self) -> Option<&dyn FundamentalsProvider> {
        None
    }
    /// If implemented, returns a trait object for option chains.
    fn as_options_chain_provider(&self) -> Option<&dyn OptionsChainProvider> {
        None
    }
    /// If implemented, returns a trait object for option expirations.
    fn as_options_expirations_provider(&self) -> Option<&dyn OptionsExpirationsProvider> {
        None
    }
    /// If implemented, returns a trait object for earnings.
    fn as_earnings_provider(&self) -> Option<&dyn EarningsProvider> {
        None
    }
    /// If implemented, returns a trait object for macro series.
    fn as_macro_provider(&self) -> Option<&dyn MacroProvider> {
        None
    }

    /// Whether this adapter can serve `data_type`.
    ///
    /// Derived from the accessors; override only to narrow support further.
    fn supports(&self, data_type: DataType) -> bool {
        match data_type {
            DataType::Quote => self.as_quote_provider().is_some(),
            DataType::History => self.as_history_provider().is_some(),
            DataType::Info => self.as_info_provider().is_some(),
            DataType::Fundamentals => self.as_fundamentals_provider().is_some(),
            DataType::OptionsChain => self.as_options_chain_provider().is_some(),
            DataType::OptionsExpirations => self.as_options_expirations_provider().is_some(),
            DataType::Earnings => self.as_earnings_provider().is_some(),
            DataType::Macro => self.as_macro_provider().is_some(),
        }
    }

    /// Every data type this adapter can serve.
    fn capabilities(&self) -> DataTypes {
        DataType::ALL
            .iter()
            .copied()
            .filter(|dt| self.supports(*dt))
            .collect()
    }
}

/// Route a request to the matching role trait on `adapter`.
///
/// # Errors
/// Returns `Unsupported` when the adapter does not serve the request's data
/// type, otherwise whatever the role method returns.
pub async fn fetch_from(
    adapter: &dyn ProviderAdapter,
    req: &DataRequest,
) -> Result<MarketData, MercatoError> {
    let unsupported = || MercatoError::unsupported(req.data_type().as_str());
    match req {
        DataRequest::Quote { symbol } => {
            let p = adapter.as_quote_provider().ok_or_else(unsupported)?;
            p.quote(symbol).await.map(MarketData::from)
        }
        DataRequest::History { symbol, query } => {
            let p = adapter.as_history_provider().ok_or_else(unsupported)?;
            p.history(symbol, query).await.map(MarketData::from)
        }
        DataRequest::Info { symbol } => {
            let p = adapter.as_info_provider().ok_or_else(unsupported)?;
            p.info(symbol).await.map(MarketData::from)
        }
        DataRequest::Fundamentals { symbol } => {
            let p = adapter.as_fundamentals_provider().ok_or_else(unsupported)?;
            p.fundamentals(symbol).await.map(MarketData::from)
        }
        DataRequest::OptionsChain { symbol, expiry } => {
            let p = adapter.as_options_chain_provider().ok_or_else(unsupported)?;
            p.options_chain(symbol, *expiry).await.map(MarketData::from)
        }
        DataRequest::OptionsExpirations { symbol } => {
            let p = adapter
                .as_options_expirations_provider()
                .ok_or_else(unsupported)?;
            p.options_expirations(symbol).await.map(MarketData::from)
        }
        DataRequest::Earnings { symbol } => {
            let p = adapter.as_earnings_provider().ok_or_else(unsupported)?;
            p.earnings(symbol).await.map(MarketData::from)
        }
        DataRequest::Macro { series_id } => {
            let p = adapter.as_macro_provider().ok_or_else(unsupported)?;
            p.macro_series(series_id).await.map(MarketData::from)
        }
    }
}

/// Generate `as_*_provider` accessors for a wrapper that implements
/// `ProviderAdapter` by delegating to an inner field.
///
/// The wrapper must itself implement every role trait; each accessor returns
/// `self` only when the inner adapter advertises the capability.
#[macro_export]
macro_rules! mercato_adapter_accessors {
    ($inner:ident) => {
        $crate::mercato_adapter_accessors!(@one $inner, as_quote_provider, QuoteProvider);
        $crate::mercato_adapter_accessors!(@one $inner, as_history_provider, HistoryProvider);
        $crate::mercato_adapter_accessors!(@one $inner, as_info_provider, InfoProvider);
        $crate::mercato_adapter_accessors!(
            @one $inner, as_fundamentals_provider, FundamentalsProvider
        );
        $crate::mercato_adapter_accessors!(
            @one $inner, as_options_chain_provider, OptionsChainProvider
        );
        $crate::mercato_adapter_accessors!(
            @one $inner, as_options_expirations_provider, OptionsExpirationsProvider
        );
        $crate::mercato_adapter_accessors!(@one $inner, as_earnings_provider, EarningsProvider);
        $crate::mercato_adapter_accessors!(@one $inner, as_macro_provider, MacroProvider);
    };
    (@one $inner:ident, $accessor:ident, $role:ident) => {
        fn $accessor(&self) -> Option<&dyn $crate::adapter::$role> {
            if self.$inner.$accessor().is_some() {
                Some(self as &dyn $crate::adapter::$role)
            } else {
                None
            }
        }
    };
}
