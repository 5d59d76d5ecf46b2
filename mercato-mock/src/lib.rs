//! Scriptable mock provider for tests and demos.
//!
//! [`MockProvider`] serves deterministic fixture data by default. Tests
//! override behavior per data type ([`MockBehavior`] or a closure), add fixed
//! latency, flip a runtime failure switch and read invocation counters.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mercato_core::adapter::{
    EarningsProvider, FundamentalsProvider, HistoryProvider, InfoProvider, MacroProvider,
    OptionsChainProvider, OptionsExpirationsProvider, QuoteProvider,
};
use mercato_core::{
    CompanyInfo, DataRequest, DataType, DataTypes, Earnings, Fundamentals, History, HistoryQuery,
    MacroSeries, MarketData, MercatoError, NaiveDate, OptionsChain, OptionsExpirations,
    ProviderAdapter, Quote,
};
use parking_lot::Mutex;

mod fixtures;

/// Instruction for how a data type should be served.
#[derive(Clone)]
pub enum MockBehavior {
    /// Return the provided envelope (re-attributed to this provider).
    Return(MarketData),
    /// Fail immediately with the provided error.
    Fail(MercatoError),
    /// Never complete (simulate a stalled upstream).
    Hang,
}

impl MockBehavior {
    /// Shorthand for `Return(value.into())`.
    pub fn ok(value: impl Into<MarketData>) -> Self {
        Self::Return(value.into())
    }
}

type ServeFn = Arc<dyn Fn(&DataRequest) -> Result<MarketData, MercatoError> + Send + Sync>;

#[derive(Clone)]
enum Rule {
    Behavior(MockBehavior),
    Func(ServeFn),
}

/// Deterministic, scriptable provider adapter.
pub struct MockProvider {
    name: String,
    data_types: DataTypes,
    delay: Duration,
    rules: Mutex<HashMap<DataType, Rule>>,
    failing: AtomicBool,
    calls: [AtomicU64; DataType::ALL.len()],
}

impl MockProvider {
    /// Mock named `name` serving every data type from fixtures.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_types: DataTypes::all(),
            delay: Duration::ZERO,
            rules: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
            calls: Default::default(),
        }
    }

    /// Restrict the advertised data types.
    #[must_use]
    pub fn with_data_types(mut self, data_types: DataTypes) -> Self {
        self.data_types = data_types;
        self
    }

    /// Sleep this long (on the Tokio clock) before answering every call.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Script `data_type` with a fixed behavior.
    #[must_use]
    pub fn with_behavior(self, data_type: DataType, behavior: MockBehavior) -> Self {
        self.set_behavior(data_type, behavior);
        self
    }

    /// Script `data_type` with a closure over the normalized request.
    #[must_use]
    pub fn with_fn<F>(self, data_type: DataType, f: F) -> Self
    where
        F: Fn(&DataRequest) -> Result<MarketData, MercatoError> + Send + Sync + 'static,
    {
        self.rules.lock().insert(data_type, Rule::Func(Arc::new(f)));
        self
    }

    /// Replace the behavior for `data_type` at runtime.
    pub fn set_behavior(&self, data_type: DataType, behavior: MockBehavior) {
        self.rules.lock().insert(data_type, Rule::Behavior(behavior));
    }

    /// Drop any scripted behavior for `data_type`, reverting to fixtures.
    pub fn clear_behavior(&self, data_type: DataType) {
        self.rules.lock().remove(&data_type);
    }

    /// When set, every call fails with a provider error regardless of scripting.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Invocations received for `data_type`.
    #[must_use]
    pub fn calls(&self, data_type: DataType) -> u64 {
        self.calls[slot(data_type)].load(Ordering::SeqCst)
    }

    /// Invocations received for every data type.
    #[must_use]
    pub fn total_calls(&self) -> u64 {
        self.calls.iter().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    /// Zero every invocation counter.
    pub fn reset_calls(&self) {
        for c in &self.calls {
            c.store(0, Ordering::SeqCst);
        }
    }

    async fn serve(&self, req: DataRequest) -> Result<MarketData, MercatoError> {
        let data_type = req.data_type();
        self.calls[slot(data_type)].fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(MercatoError::provider(
                &self.name,
                format!("forced failure: {data_type}"),
            ));
        }
        let rule = self.rules.lock().get(&data_type).cloned();
        match rule {
            Some(Rule::Behavior(MockBehavior::Return(v))) => Ok(v.with_source(&self.name)),
            Some(Rule::Behavior(MockBehavior::Fail(e))) => Err(e),
            Some(Rule::Behavior(MockBehavior::Hang)) => {
                std::future::pending::<Result<MarketData, MercatoError>>().await
            }
            Some(Rule::Func(f)) => f(&req).map(|v| v.with_source(&self.name)),
            None => fixtures::lookup(&self.name, &req),
        }
    }
}

fn slot(data_type: DataType) -> usize {
    DataType::ALL
        .iter()
        .position(|d| *d == data_type)
        .unwrap_or_default()
}

impl ProviderAdapter for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, data_type: DataType) -> bool {
        self.data_types.has(data_type)
    }

    fn as_quote_provider(&self) -> Option<&dyn QuoteProvider> {
        self.supports(DataType::Quote)
            .then_some(self as &dyn QuoteProvider)
    }
    fn as_history_provider(&self) -> Option<&dyn HistoryProvider> {
        self.supports(DataType::History)
            .then_some(self as &dyn HistoryProvider)
    }
    fn as_info_provider(&self) -> Option<&dyn InfoProvider> {
        self.supports(DataType::Info)
            .then_some(self as &dyn InfoProvider)
    }
    fn as_fundamentals_provider(&self) -> Option<&dyn FundamentalsProvider> {
        self.supports(DataType::Fundamentals)
            .then_some(self as &dyn FundamentalsProvider)
    }
    fn as_options_chain_provider(&self) -> Option<&dyn OptionsChainProvider> {
        self.supports(DataType::OptionsChain)
            .then_some(self as &dyn OptionsChainProvider)
    }
    fn as_options_expirations_provider(&self) -> Option<&dyn OptionsExpirationsProvider> {
        self.supports(DataType::OptionsExpirations)
            .then_some(self as &dyn OptionsExpirationsProvider)
    }
    fn as_earnings_provider(&self) -> Option<&dyn EarningsProvider> {
        self.supports(DataType::Earnings)
            .then_some(self as &dyn EarningsProvider)
    }
    fn as_macro_provider(&self) -> Option<&dyn MacroProvider> {
        self.supports(DataType::Macro)
            .then_some(self as &dyn MacroProvider)
    }
}

#[async_trait]
impl QuoteProvider for MockProvider {
    async fn quote(&self, symbol: &str) -> Result<Quote, MercatoError> {
        let req = DataRequest::Quote {
            symbol: symbol.to_string(),
        };
        self.serve(req).await.and_then(Quote::try_from)
    }
}

#[async_trait]
impl HistoryProvider for MockProvider {
    async fn history(&self, symbol: &str, query: &HistoryQuery) -> Result<History, MercatoError> {
        let req = DataRequest::History {
            symbol: symbol.to_string(),
            query: *query,
        };
        self.serve(req).await.and_then(History::try_from)
    }
}

#[async_trait]
impl InfoProvider for MockProvider {
    async fn info(&self, symbol: &str) -> Result<CompanyInfo, MercatoError> {
        let req = DataRequest::Info {
            symbol: symbol.to_string(),
        };
        self.serve(req).await.and_then(CompanyInfo::try_from)
    }
}

#[async_trait]
impl FundamentalsProvider for MockProvider {
    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, MercatoError> {
        let req = DataRequest::Fundamentals {
            symbol: symbol.to_string(),
        };
        self.serve(req).await.and_then(Fundamentals::try_from)
    }
}

#[async_trait]
impl OptionsChainProvider for MockProvider {
    async fn options_chain(
        &self,
        symbol: &str,
        expiry: NaiveDate,
    ) -> Result<OptionsChain, MercatoError> {
        let req = DataRequest::OptionsChain {
            symbol: symbol.to_string(),
            expiry,
        };
        self.serve(req).await.and_then(OptionsChain::try_from)
    }
}

#[async_trait]
impl OptionsExpirationsProvider for MockProvider {
    async fn options_expirations(&self, symbol: &str) -> Result<OptionsExpirations, MercatoError> {
        let req = DataRequest::OptionsExpirations {
            symbol: symbol.to_string(),
        };
        self.serve(req).await.and_then(OptionsExpirations::try_from)
    }
}

#[async_trait]
impl EarningsProvider for MockProvider {
    async fn earnings(&self, symbol: &str) -> Result<Earnings, MercatoError> {
        let req = DataRequest::Earnings {
            symbol: symbol.to_string(),
        };
        self.serve(req).await.and_then(Earnings::try_from)
    }
}

#[async_trait]
impl MacroProvider for MockProvider {
    async fn macro_series(&self, series_id: &str) -> Result<MacroSeries, MercatoError> {
        let req = DataRequest::Macro {
            series_id: series_id.to_string(),
        };
        self.serve(req).await.and_then(MacroSeries::try_from)
    }
}
