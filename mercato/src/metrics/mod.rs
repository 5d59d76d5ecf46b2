//! Call recording and aggregate statistics.
//!
//! Recording appends and bumps counters; percentiles and rates are computed
//! when a snapshot is requested.

mod sink;

pub use sink::{CallSink, JsonLineSink, MemorySink, TracingSink};

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mercato_core::{
    CacheStats, CallRecord, DataType, DataTypeStats, FailureKind, LatencyPercentiles,
    LatencySummary, MetricsConfig, MetricsSnapshot, ProviderHealthSnapshot, ProviderStats,
    StatsSnapshot, TotalStats,
};
use parking_lot::Mutex;
use tokio::time::Instant;

const RECENT_ERRORS: usize = 10;

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    calls: u64,
    successes: u64,
    failures: u64,
    cache_hits: u64,
    fallbacks: u64,
    deduplicated: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct ProviderTally {
    attempts: u64,
    successes: u64,
    failures: u64,
    not_found: u64,
    rate_limited: u64,
    timeouts: u64,
    latency_sum: f64,
    latency_min: f64,
    latency_max: f64,
}

impl ProviderTally {
    fn add(&mut self, latency_ms: f64, failure: Option<FailureKind>) {
        if self.attempts == 0 {
            self.latency_min = latency_ms;
            self.latency_max = latency_ms;
        } else {
            self.latency_min = self.latency_min.min(latency_ms);
            self.latency_max = self.latency_max.max(latency_ms);
        }
        self.attempts += 1;
        self.latency_sum += latency_ms;
        match failure {
            None => self.successes += 1,
            Some(kind) => {
                self.failures += 1;
                match kind {
                    FailureKind::NotFound => self.not_found += 1,
                    FailureKind::RateLimited => self.rate_limited += 1,
                    FailureKind::Timeout => self.timeouts += 1,
                    FailureKind::Provider => {}
                }
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct DataTypeTally {
    calls: u64,
    successes: u64,
    failures: u64,
    cache_hits: u64,
    fallbacks: u64,
    latency_sum: f64,
}

#[derive(Debug, Default)]
struct Aggregates {
    totals: Totals,
    providers: BTreeMap<String, ProviderTally>,
    data_types: BTreeMap<DataType, DataTypeTally>,
}

#[derive(Debug, Default)]
struct Samples {
    calls: VecDeque<f64>,
    providers: HashMap<String, VecDeque<f64>>,
}

fn push_bounded<T>(q: &mut VecDeque<T>, cap: usize, v: T) {
    if q.len() >= cap {
        q.pop_front();
    }
    q.push_back(v);
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Nearest-rank percentiles over `samples`.
pub fn percentiles(samples: impl IntoIterator<Item = f64>) -> LatencyPercentiles {
    let mut v: Vec<f64> = samples.into_iter().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return LatencyPercentiles::default();
    }
    v.sort_by(f64::total_cmp);
    let rank = |p: f64| {
        let idx = ((p / 100.0) * v.len() as f64).ceil() as usize;
        v[idx.saturating_sub(1).min(v.len() - 1)]
    };
    LatencyPercentiles {
        samples: v.len(),
        p50: rank(50.0),
        p90: rank(90.0),
        p95: rank(95.0),
        p99: rank(99.0),
    }
}

/// Aggregates every [`CallRecord`] the service produces.
pub struct MetricsCollector {
    started_at: DateTime<Utc>,
    started: Instant,
    config: MetricsConfig,
    aggregates: Mutex<Aggregates>,
    recent: Mutex<VecDeque<CallRecord>>,
    samples: Mutex<Samples>,
    sinks: Vec<Arc<dyn CallSink>>,
}

impl MetricsCollector {
    /// Collector with the given retention bounds and sinks.
    pub fn new(config: MetricsConfig, sinks: Vec<Arc<dyn CallSink>>) -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
            config,
            aggregates: Mutex::new(Aggregates::default()),
            recent: Mutex::new(VecDeque::new()),
            samples: Mutex::new(Samples::default()),
            sinks,
        }
    }

    /// Retention bounds in use.
    pub const fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Append one call and notify the sinks.
    pub fn record(&self, record: CallRecord) {
        {
            let mut agg = self.aggregates.lock();
            let t = &mut agg.totals;
            t.calls += 1;
            if record.is_error() {
                t.failures += 1;
            } else {
                t.successes += 1;
            }
            t.cache_hits += u64::from(record.cache_hit);
            t.fallbacks += u64::from(record.fallback_used);
            t.deduplicated += u64::from(record.deduplicated);

            let d = agg.data_types.entry(record.data_type).or_default();
            d.calls += 1;
            if record.is_error() {
                d.failures += 1;
            } else {
                d.successes += 1;
            }
            d.cache_hits += u64::from(record.cache_hit);
            d.fallbacks += u64::from(record.fallback_used);
            d.latency_sum += record.latency_ms;

            for a in &record.attempts {
                agg.providers
                    .entry(a.provider.clone())
                    .or_default()
                    .add(a.latency_ms, a.failure);
            }
        }
        {
            let cap = self.config.latency_window.max(1);
            let mut s = self.samples.lock();
            push_bounded(&mut s.calls, cap, record.latency_ms);
            for a in &record.attempts {
                let q = s.providers.entry(a.provider.clone()).or_default();
                push_bounded(q, cap, a.latency_ms);
            }
        }
        for sink in &self.sinks {
            sink.on_call_recorded(&record);
        }
        let cap = self.config.recent_calls_capacity.max(1);
        push_bounded(&mut self.recent.lock(), cap, record);
    }

    /// Most recent calls first, optionally filtered.
    pub fn recent_calls(
        &self,
        limit: usize,
        data_type: Option<DataType>,
        errors_only: bool,
    ) -> Vec<CallRecord> {
        self.recent
            .lock()
            .iter()
            .rev()
            .filter(|r| data_type.is_none_or(|dt| r.data_type == dt))
            .filter(|r| !errors_only || r.is_error())
            .take(limit)
            .cloned()
            .collect()
    }

    /// Percentiles of end-to-end call latency, or of one provider's attempt latency.
    pub fn latency_percentiles(&self, provider: Option<&str>) -> LatencyPercentiles {
        let s = self.samples.lock();
        match provider {
            None => percentiles(s.calls.iter().copied()),
            Some(p) => s
                .providers
                .get(p)
                .map(|q| percentiles(q.iter().copied()))
                .unwrap_or_default(),
        }
    }

    /// Aggregate snapshot.
    ///
    /// `health` supplies each provider's last error and makes providers that
    /// were never attempted show up with zeroed counters.
    pub fn stats(&self, cache: CacheStats, health: Vec<ProviderHealthSnapshot>) -> StatsSnapshot {
        let (totals, mut providers, data_types) = {
            let agg = self.aggregates.lock();
            let t = agg.totals;
            let totals = TotalStats {
                calls: t.calls,
                successes: t.successes,
                failures: t.failures,
                cache_hits: t.cache_hits,
                cache_misses: t.calls - t.cache_hits,
                fallbacks: t.fallbacks,
                deduplicated: t.deduplicated,
                cache_hit_rate: ratio(t.cache_hits, t.calls),
                failure_rate: ratio(t.failures, t.calls),
                fallback_rate: ratio(t.fallbacks, t.calls),
            };
            let providers: BTreeMap<String, ProviderStats> = agg
                .providers
                .iter()
                .map(|(name, p)| {
                    let stats = ProviderStats {
                        name: name.clone(),
                        attempts: p.attempts,
                        successes: p.successes,
                        failures: p.failures,
                        not_found: p.not_found,
                        rate_limited: p.rate_limited,
                        timeouts: p.timeouts,
                        success_rate: (p.attempts > 0).then(|| ratio(p.successes, p.attempts)),
                        latency: LatencySummary {
                            min_ms: p.latency_min,
                            avg_ms: if p.attempts == 0 {
                                0.0
                            } else {
                                p.latency_sum / p.attempts as f64
                            },
                            max_ms: p.latency_max,
                        },
                        last_error: None,
                        last_error_time: None,
                    };
                    (name.clone(), stats)
                })
                .collect();
            let data_types: BTreeMap<DataType, DataTypeStats> = agg
                .data_types
                .iter()
                .map(|(dt, d)| {
                    let stats = DataTypeStats {
                        calls: d.calls,
                        successes: d.successes,
                        failures: d.failures,
                        cache_hits: d.cache_hits,
                        fallbacks: d.fallbacks,
                        avg_latency_ms: if d.calls == 0 {
                            0.0
                        } else {
                            d.latency_sum / d.calls as f64
                        },
                    };
                    (*dt, stats)
                })
                .collect();
            (totals, providers, data_types)
        };

        for h in &health {
            let p = providers.entry(h.name.clone()).or_insert_with(|| ProviderStats {
                name: h.name.clone(),
                ..ProviderStats::default()
            });
            p.last_error.clone_from(&h.state.last_error);
            p.last_error_time = h.state.last_error_time;
        }

        let recent_errors = self.recent_calls(RECENT_ERRORS, None, true);
        StatsSnapshot {
            started_at: self.started_at,
            uptime_seconds: self.started.elapsed().as_secs(),
            totals,
            providers,
            data_types,
            recent_errors,
            cache,
            health,
        }
    }

    /// Detailed snapshot: [`stats`](Self::stats) plus latency and the full recent-call log.
    pub fn metrics(&self, cache: CacheStats, health: Vec<ProviderHealthSnapshot>) -> MetricsSnapshot {
        let stats = self.stats(cache, health);
        let (latency, provider_latency) = {
            let s = self.samples.lock();
            let latency = percentiles(s.calls.iter().copied());
            let provider_latency = s
                .providers
                .iter()
                .map(|(name, q)| (name.clone(), percentiles(q.iter().copied())))
                .collect();
            (latency, provider_latency)
        };
        MetricsSnapshot {
            stats,
            latency,
            provider_latency,
            recent_calls: self.recent_calls(usize::MAX, None, false),
        }
    }

    /// Forget every recorded call. Sinks stay installed.
    pub fn reset(&self) {
        *self.aggregates.lock() = Aggregates::default();
        *self.samples.lock() = Samples::default();
        self.recent.lock().clear();
    }
}
