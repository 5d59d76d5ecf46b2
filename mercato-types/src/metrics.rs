//! Call records and the aggregate snapshots built from them.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data_type::DataType;
use crate::error::{FailureKind, MercatoError};
use crate::health::ProviderHealthSnapshot;

/// How a service-level call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// A value was returned (fresh, cached or via a dedup leader).
    Success,
    /// No value could be produced.
    Failure,
}

/// One adapter invocation inside a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    /// Provider name.
    pub provider: String,
    /// Time spent in the adapter, in milliseconds.
    pub latency_ms: f64,
    /// `None` on success, otherwise the failure classification.
    pub failure: Option<FailureKind>,
}

/// Append-only record of one service-level operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Wall-clock completion time.
    pub timestamp: DateTime<Utc>,
    /// Requested data type.
    pub data_type: DataType,
    /// Normalized symbol (or macro series id).
    pub symbol: String,
    /// Full request key.
    pub key: String,
    /// Providers attempted, in order.
    pub providers_tried: Vec<String>,
    /// Provider whose value was returned.
    pub provider_used: Option<String>,
    /// Overall outcome.
    pub outcome: CallOutcome,
    /// Served from cache without touching any provider.
    pub cache_hit: bool,
    /// Served by a provider other than the first eligible one.
    pub fallback_used: bool,
    /// Served by awaiting another caller's in-flight fetch.
    pub deduplicated: bool,
    /// End-to-end latency, in milliseconds.
    pub latency_ms: f64,
    /// Per-adapter detail, in try order.
    pub attempts: Vec<ProviderAttempt>,
    /// Final error when `outcome` is `Failure`.
    pub error: Option<MercatoError>,
}

impl CallRecord {
    /// End-to-end latency as a `Duration`.
    #[must_use]
    pub fn latency(&self) -> Duration {
        Duration::from_secs_f64(self.latency_ms.max(0.0) / 1_000.0)
    }

    /// Whether the call failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.outcome == CallOutcome::Failure
    }
}

/// Latency percentiles in milliseconds over the retained window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatencyPercentiles {
    /// Samples the percentiles were computed from.
    pub samples: usize,
    /// Median.
    pub p50: f64,
    /// 90th percentile.
    pub p90: f64,
    /// 95th percentile.
    pub p95: f64,
    /// 99th percentile.
    pub p99: f64,
}

/// Min/avg/max latency in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Fastest observed.
    pub min_ms: f64,
    /// Mean.
    pub avg_ms: f64,
    /// Slowest observed.
    pub max_ms: f64,
}

/// Process-wide totals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TotalStats {
    /// Service-level calls recorded.
    pub calls: u64,
    /// Calls that returned a value.
    pub successes: u64,
    /// Calls that returned no value.
    pub failures: u64,
    /// Calls served from cache.
    pub cache_hits: u64,
    /// Calls that missed the cache.
    pub cache_misses: u64,
    /// Calls served by a fallback provider.
    pub fallbacks: u64,
    /// Calls served by awaiting an in-flight leader.
    pub deduplicated: u64,
    /// `cache_hits / calls`.
    pub cache_hit_rate: f64,
    /// `failures / calls`.
    pub failure_rate: f64,
    /// `fallbacks / calls`.
    pub fallback_rate: f64,
}

/// Aggregates for one provider, over every attempt since start (or reset).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderStats {
    /// Provider name.
    pub name: String,
    /// Adapter invocations.
    pub attempts: u64,
    /// Successful invocations.
    pub successes: u64,
    /// Failed invocations.
    pub failures: u64,
    /// Failures classified as `NotFound`.
    pub not_found: u64,
    /// Failures classified as `RateLimited`.
    pub rate_limited: u64,
    /// Failures classified as `Timeout`.
    pub timeouts: u64,
    /// `successes / attempts`, if any attempt was made.
    pub success_rate: Option<f64>,
    /// Latency over all attempts.
    pub latency: LatencySummary,
    /// Most recent failure.
    pub last_error: Option<MercatoError>,
    /// When the most recent failure happened.
    pub last_error_time: Option<DateTime<Utc>>,
}

/// Aggregates for one data type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DataTypeStats {
    /// Service-level calls.
    pub calls: u64,
    /// Calls that returned a value.
    pub successes: u64,
    /// Calls that returned no value.
    pub failures: u64,
    /// Calls served from cache.
    pub cache_hits: u64,
    /// Calls served by a fallback provider.
    pub fallbacks: u64,
    /// Mean end-to-end latency, in milliseconds.
    pub avg_latency_ms: f64,
}

/// Read-only view of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Live entries (expired entries not yet purged included).
    pub entries: usize,
    /// Configured entry budget.
    pub capacity: usize,
    /// Lookups that returned a value.
    pub hits: u64,
    /// Lookups that returned nothing (including expired entries).
    pub misses: u64,
    /// `hits / (hits + misses)`.
    pub hit_rate: f64,
    /// Entries dropped by capacity pressure.
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed.
    pub expirations: u64,
}

/// Aggregate snapshot returned by `get_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// When collection started.
    pub started_at: DateTime<Utc>,
    /// Seconds since `started_at`.
    pub uptime_seconds: u64,
    /// Process-wide totals.
    pub totals: TotalStats,
    /// Per-provider aggregates, keyed by name.
    pub providers: BTreeMap<String, ProviderStats>,
    /// Per-data-type aggregates.
    pub data_types: BTreeMap<DataType, DataTypeStats>,
    /// Most recent failed calls, newest first.
    pub recent_errors: Vec<CallRecord>,
    /// Cache counters.
    pub cache: CacheStats,
    /// Provider health, in priority order.
    pub health: Vec<ProviderHealthSnapshot>,
}

/// Detailed snapshot returned by `get_metrics`; a superset of [`StatsSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Everything `get_stats` reports.
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    /// Percentiles across every provider.
    pub latency: LatencyPercentiles,
    /// Percentiles per provider.
    pub provider_latency: BTreeMap<String, LatencyPercentiles>,
    /// Recent calls, newest first.
    pub recent_calls: Vec<CallRecord>,
}
