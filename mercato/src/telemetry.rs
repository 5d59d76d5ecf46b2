//! Read-only operational views and operator controls.

use mercato_core::{
    CacheStats, CallRecord, DataRequest, DataType, LatencyPercentiles, MercatoError,
    MetricsSnapshot, ProviderHealthSnapshot, StatsSnapshot,
};

use crate::MarketDataService;

impl MarketDataService {
    /// Aggregate snapshot: uptime, totals, per-provider, per-data-type and recent errors.
    #[must_use]
    pub fn get_stats(&self) -> StatsSnapshot {
        let inner = &self.inner;
        inner
            .metrics
            .stats(inner.cache.stats(), inner.registry.snapshots())
    }

    /// [`get_stats`](Self::get_stats) plus latency percentiles and the recent-call log.
    #[must_use]
    pub fn get_metrics(&self) -> MetricsSnapshot {
        let inner = &self.inner;
        inner
            .metrics
            .metrics(inner.cache.stats(), inner.registry.snapshots())
    }

    /// Health of one provider, or `None` for an unknown name.
    #[must_use]
    pub fn get_provider_health(&self, name: &str) -> Option<ProviderHealthSnapshot> {
        self.inner.registry.snapshot(name)
    }

    /// Health of every provider, in priority order.
    #[must_use]
    pub fn get_all_provider_health(&self) -> Vec<ProviderHealthSnapshot> {
        self.inner.registry.snapshots()
    }

    /// Latency percentiles over end-to-end calls, or over one provider's attempts.
    #[must_use]
    pub fn get_latency_percentiles(&self, provider: Option<&str>) -> LatencyPercentiles {
        self.inner.metrics.latency_percentiles(provider)
    }

    /// Up to `limit` recent calls, most recent first.
    #[must_use]
    pub fn get_recent_calls(
        &self,
        limit: usize,
        data_type: Option<DataType>,
        errors_only: bool,
    ) -> Vec<CallRecord> {
        self.inner.metrics.recent_calls(limit, data_type, errors_only)
    }

    /// Cache counters.
    #[must_use]
    pub fn get_cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    /// Drop the cached value for `request`. Returns whether one was present.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an empty symbol.
    pub fn invalidate(&self, request: &DataRequest) -> Result<bool, MercatoError> {
        let key = request.normalized()?.key();
        Ok(self.inner.cache.invalidate(&key))
    }

    /// Drop every cached value.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Drop expired cache entries now rather than on their next lookup.
    pub fn purge_expired(&self) -> usize {
        self.inner.cache.purge_expired()
    }

    /// Forget recorded calls and zero the cache counters. Health state is kept.
    pub fn reset_metrics(&self) {
        self.inner.metrics.reset();
        self.inner.cache.reset_counters();
    }
}
