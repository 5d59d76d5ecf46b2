//! Sliding-window rate limiter and the adapter wrapper that enforces it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mercato_core::adapter::{
    EarningsProvider, FundamentalsProvider, HistoryProvider, InfoProvider, MacroProvider,
    OptionsChainProvider, OptionsExpirationsProvider, QuoteProvider,
};
use mercato_core::{
    CompanyInfo, DataType, Earnings, Fundamentals, History, HistoryQuery, MacroSeries,
    MercatoError, Middleware, NaiveDate, OptionsChain, OptionsExpirations, ProviderAdapter, Quote,
};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Admits at most `limit` calls in any trailing `window`.
///
/// Timestamps come from `tokio::time::Instant`, so paused-clock tests can
/// drive the window deterministically.
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Limiter admitting `limit` calls per `window`.
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Self {
            limit,
            window,
            calls: Mutex::new(VecDeque::with_capacity(limit.min(1_024))),
        }
    }

    /// Limiter admitting `rpm` calls per minute.
    #[must_use]
    pub fn per_minute(rpm: u32) -> Self {
        Self::new(rpm, Duration::from_secs(60))
    }

    /// Configured budget per window.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Configured window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Try to consume one unit of budget.
    ///
    /// # Errors
    /// Returns the time until the oldest admitted call leaves the window when
    /// the budget is spent.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut calls = self.calls.lock();
        while let Some(&oldest) = calls.front() {
            if now.duration_since(oldest) >= self.window {
                calls.pop_front();
            } else {
                break;
            }
        }
        if calls.len() < self.limit {
            calls.push_back(now);
            return Ok(());
        }
        let wait = calls.front().map_or(self.window, |&oldest| {
            self.window.saturating_sub(now.duration_since(oldest))
        });
        Err(wait)
    }

    /// Calls that would still be admitted in the current window.
    #[must_use]
    pub fn remaining(&self) -> usize {
        let now = Instant::now();
        let calls = self.calls.lock();
        let live = calls
            .iter()
            .filter(|&&t| now.duration_since(t) < self.window)
            .count();
        self.limit.saturating_sub(live)
    }
}

/// Adapter wrapper that consults a [`RateLimiter`] before every outbound call.
///
/// Calls for data types the inner adapter does not serve are rejected as
/// `Unsupported` without consuming budget.
pub struct RateLimitedAdapter {
    inner: Arc<dyn ProviderAdapter>,
    limiter: RateLimiter,
}

impl RateLimitedAdapter {
    /// Wrap `inner` with `limiter`.
    pub fn new(inner: Arc<dyn ProviderAdapter>, limiter: RateLimiter) -> Self {
        Self { inner, limiter }
    }

    /// Access the inner adapter.
    pub fn inner(&self) -> &Arc<dyn ProviderAdapter> {
        &self.inner
    }

    /// Access the limiter.
    pub const fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    fn admit(&self) -> Result<(), MercatoError> {
        self.limiter.try_acquire().map_err(|wait| {
            let retry_after_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
            tracing::debug!(
                target: "mercato::middleware",
                provider = self.inner.name(),
                retry_after_ms,
                "local rate limit exhausted"
            );
            MercatoError::rate_limited(self.inner.name(), Some(retry_after_ms))
        })
    }
}

fn unsupported(data_type: DataType) -> MercatoError {
    MercatoError::unsupported(data_type.as_str())
}

impl ProviderAdapter for RateLimitedAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn supports(&self, data_type: DataType) -> bool {
        self.inner.supports(data_type)
    }

    mercato_core::mercato_adapter_accessors!(inner);
}

#[async_trait]
impl QuoteProvider for RateLimitedAdapter {
    async fn quote(&self, symbol: &str) -> Result<Quote, MercatoError> {
        let inner = self
            .inner
            .as_quote_provider()
            .ok_or_else(|| unsupported(DataType::Quote))?;
        self.admit()?;
        inner.quote(symbol).await
    }
}

#[async_trait]
impl HistoryProvider for RateLimitedAdapter {
    async fn history(&self, symbol: &str, query: &HistoryQuery) -> Result<History, MercatoError> {
        let inner = self
            .inner
            .as_history_provider()
            .ok_or_else(|| unsupported(DataType::History))?;
        self.admit()?;
        inner.history(symbol, query).await
    }
}

#[async_trait]
impl InfoProvider for RateLimitedAdapter {
    async fn info(&self, symbol: &str) -> Result<CompanyInfo, MercatoError> {
        let inner = self
            .inner
            .as_info_provider()
            .ok_or_else(|| unsupported(DataType::Info))?;
        self.admit()?;
        inner.info(symbol).await
    }
}

#[async_trait]
impl FundamentalsProvider for RateLimitedAdapter {
    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, MercatoError> {
        let inner = self
            .inner
            .as_fundamentals_provider()
            .ok_or_else(|| unsupported(DataType::Fundamentals))?;
        self.admit()?;
        inner.fundamentals(symbol).await
    }
}

#[async_trait]
impl OptionsChainProvider for RateLimitedAdapter {
    async fn options_chain(
        &self,
        symbol: &str,
        expiry: NaiveDate,
    ) -> Result<OptionsChain, MercatoError> {
        let inner = self
            .inner
            .as_options_chain_provider()
            .ok_or_else(|| unsupported(DataType::OptionsChain))?;
        self.admit()?;
        inner.options_chain(symbol, expiry).await
    }
}

#[async_trait]
impl OptionsExpirationsProvider for RateLimitedAdapter {
    async fn options_expirations(&self, symbol: &str) -> Result<OptionsExpirations, MercatoError> {
        let inner = self
            .inner
            .as_options_expirations_provider()
            .ok_or_else(|| unsupported(DataType::OptionsExpirations))?;
        self.admit()?;
        inner.options_expirations(symbol).await
    }
}

#[async_trait]
impl EarningsProvider for RateLimitedAdapter {
    async fn earnings(&self, symbol: &str) -> Result<Earnings, MercatoError> {
        let inner = self
            .inner
            .as_earnings_provider()
            .ok_or_else(|| unsupported(DataType::Earnings))?;
        self.admit()?;
        inner.earnings(symbol).await
    }
}

#[async_trait]
impl MacroProvider for RateLimitedAdapter {
    async fn macro_series(&self, series_id: &str) -> Result<MacroSeries, MercatoError> {
        let inner = self
            .inner
            .as_macro_provider()
            .ok_or_else(|| unsupported(DataType::Macro))?;
        self.admit()?;
        inner.macro_series(series_id).await
    }
}

/// Middleware config for constructing a [`RateLimitedAdapter`].
#[derive(Debug, Clone, Copy)]
pub struct RateLimitMiddleware {
    /// Requests admitted per minute.
    pub requests_per_minute: u32,
}

impl RateLimitMiddleware {
    /// Middleware admitting `requests_per_minute` calls per minute.
    #[must_use]
    pub const fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
        }
    }
}

impl Middleware for RateLimitMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn ProviderAdapter>) -> Arc<dyn ProviderAdapter> {
        Arc::new(RateLimitedAdapter::new(
            inner,
            RateLimiter::per_minute(self.requests_per_minute),
        ))
    }

    fn name(&self) -> &'static str {
        "RateLimitedAdapter"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({ "requests_per_minute": self.requests_per_minute })
    }
}
