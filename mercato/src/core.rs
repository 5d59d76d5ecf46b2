use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mercato_core::{
    CacheConfig, CallOutcome, CallRecord, DataRequest, DataType, MarketData, MercatoError,
    MetricsConfig, Middleware, NotFoundPolicy, ProviderAdapter, ProviderAttempt, ProviderConfig,
    RequestKey, ServiceConfig, collapse_errors, fetch_from,
};
use mercato_middleware::RateLimitMiddleware;
use tokio::time::Instant;

use crate::cache::ResponseCache;
use crate::dedup::{RequestDeduplicator, Role, WaitError};
use crate::factory::ProviderFactory;
use crate::metrics::{CallSink, MetricsCollector};
use crate::registry::ProviderRegistry;

/// Per-call overrides of the service-wide defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Overall deadline for this call, covering every fallback attempt.
    pub deadline: Option<Duration>,
    /// Bound on how long this call waits for another caller's in-flight fetch.
    pub dedup_wait: Option<Duration>,
}

impl CallOptions {
    /// Options that defer to the service defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            deadline: None,
            dedup_wait: None,
        }
    }

    /// Set the overall deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the follower wait bound.
    #[must_use]
    pub const fn with_dedup_wait(mut self, wait: Duration) -> Self {
        self.dedup_wait = Some(wait);
        self
    }
}

pub(crate) type Shared = Result<MarketData, MercatoError>;

pub(crate) struct ServiceInner {
    pub(crate) registry: ProviderRegistry,
    pub(crate) cache: ResponseCache<RequestKey, MarketData>,
    pub(crate) dedup: RequestDeduplicator<RequestKey, Shared>,
    pub(crate) metrics: MetricsCollector,
    pub(crate) cache_config: CacheConfig,
    provider_timeout: Duration,
    request_timeout: Option<Duration>,
    dedup_wait: Option<Duration>,
    not_found_policy: NotFoundPolicy,
}

/// Market data façade over a prioritized set of providers.
///
/// Cheap to clone; clones share the registry, cache, in-flight map and metrics.
#[derive(Clone)]
pub struct MarketDataService {
    pub(crate) inner: Arc<ServiceInner>,
}

/// Builder for [`MarketDataService`].
pub struct MarketDataServiceBuilder {
    providers: Vec<(Arc<dyn ProviderAdapter>, ProviderConfig)>,
    sinks: Vec<Arc<dyn CallSink>>,
    cache: CacheConfig,
    metrics: MetricsConfig,
    provider_timeout: Duration,
    request_timeout: Option<Duration>,
    dedup_wait: Option<Duration>,
    not_found_policy: NotFoundPolicy,
}

impl Default for MarketDataServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataServiceBuilder {
    /// Create a new builder with the defaults of [`ServiceConfig`].
    ///
    /// Behavior and trade-offs:
    /// - Starts with no providers; register at least one via [`with_provider`](Self::with_provider)
    ///   or [`with_config`](Self::with_config).
    /// - 10s per-provider timeout, no overall deadline, 30s follower wait.
    /// - `NotFound` keeps walking the fallback chain by default.
    #[must_use]
    pub fn new() -> Self {
        let d = ServiceConfig::default();
        Self {
            providers: Vec::new(),
            sinks: Vec::new(),
            provider_timeout: d.provider_timeout(),
            request_timeout: d.request_timeout(),
            dedup_wait: d.dedup_wait_timeout(),
            not_found_policy: d.not_found_policy,
            cache: d.cache,
            metrics: d.metrics,
        }
    }

    /// Register an adapter with its static configuration.
    ///
    /// Behavior and trade-offs:
    /// - `config.name` must equal `adapter.name()`; [`build`](Self::build) rejects mismatches.
    /// - Registration order only breaks priority ties.
    /// - When `requests_per_minute` is set the adapter is wrapped in a rate limiter at build time.
    #[must_use]
    pub fn with_provider(
        mut self,
        adapter: Arc<dyn ProviderAdapter>,
        config: ProviderConfig,
    ) -> Self {
        self.providers.push((adapter, config));
        self
    }

    /// Apply a full [`ServiceConfig`], instantiating providers through `factory`.
    ///
    /// Behavior and trade-offs:
    /// - Disabled providers are skipped.
    /// - A provider whose required credentials do not resolve is skipped with a
    ///   warning instead of failing startup.
    /// - Cache, metrics, timeout and `NotFound` settings replace the builder's current values.
    ///
    /// # Errors
    /// Returns `Config` when validation fails or a provider name has no registered constructor,
    /// and whatever the constructor returns when it fails.
    pub fn with_config(
        mut self,
        config: ServiceConfig,
        factory: &ProviderFactory,
    ) -> Result<Self, MercatoError> {
        config.validate()?;
        self.provider_timeout = config.provider_timeout();
        self.request_timeout = config.request_timeout();
        self.dedup_wait = config.dedup_wait_timeout();
        self.not_found_policy = config.not_found_policy;
        self.cache = config.cache;
        self.metrics = config.metrics;

        for p in config.providers {
            if !p.enabled {
                tracing::info!(target: "mercato::service", provider = %p.name, "provider disabled");
                continue;
            }
            let creds = match &p.credentials {
                None => None,
                Some(c) => {
                    if let Some(resolved) = c.resolve() {
                        Some(resolved)
                    } else {
                        tracing::warn!(
                            target: "mercato::service",
                            provider = %p.name,
                            env = c.api_key_env.as_deref().unwrap_or(""),
                            "credentials missing; provider skipped"
                        );
                        continue;
                    }
                }
            };
            let adapter = factory.build(&p, creds.as_ref())?;
            self.providers.push((adapter, p));
        }
        Ok(self)
    }

    /// Install an observer notified of every completed call.
    #[must_use]
    pub fn with_call_sink(mut self, sink: Arc<dyn CallSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Set the per-provider call timeout.
    ///
    /// Behavior and trade-offs:
    /// - A timed-out attempt counts as a provider failure and the next provider is tried.
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Set the default overall deadline per request.
    ///
    /// Behavior and trade-offs:
    /// - Bounds total latency when several providers fail slowly in sequence.
    /// - When exceeded, remaining fallbacks are abandoned and `RequestTimeout` is returned.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the default follower wait bound. `None` waits for the leader indefinitely.
    #[must_use]
    pub const fn dedup_wait_timeout(mut self, wait: Option<Duration>) -> Self {
        self.dedup_wait = wait;
        self
    }

    /// Choose what a `NotFound` means for the rest of the fallback chain.
    #[must_use]
    pub const fn not_found_policy(mut self, policy: NotFoundPolicy) -> Self {
        self.not_found_policy = policy;
        self
    }

    /// Replace the cache sizing and default TTLs.
    #[must_use]
    pub fn cache_config(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the metrics retention bounds.
    #[must_use]
    pub const fn metrics_config(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = metrics;
        self
    }

    /// Build the service.
    ///
    /// # Errors
    /// Returns `InvalidArg` if no provider was registered, and `Config` for
    /// duplicate names or a config name that differs from its adapter's name.
    pub fn build(self) -> Result<MarketDataService, MercatoError> {
        if self.providers.is_empty() {
            return Err(MercatoError::InvalidArg(
                "no providers registered; add at least one via with_provider(...)".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        let mut providers = Vec::with_capacity(self.providers.len());
        for (adapter, cfg) in self.providers {
            if adapter.name() != cfg.name {
                return Err(MercatoError::Config(format!(
                    "adapter named {} registered under config {}",
                    adapter.name(),
                    cfg.name
                )));
            }
            if !seen.insert(cfg.name.clone()) {
                return Err(MercatoError::Config(format!(
                    "duplicate provider name: {}",
                    cfg.name
                )));
            }
            let adapter = match cfg.requests_per_minute {
                Some(rpm) => {
                    let mw = Box::new(RateLimitMiddleware::new(rpm));
                    tracing::debug!(
                        target: "mercato::service",
                        provider = %cfg.name,
                        middleware = mw.name(),
                        config = %mw.config_json(),
                        "wrapping provider"
                    );
                    mw.apply(adapter)
                }
                None => adapter,
            };
            providers.push((adapter, cfg));
        }

        Ok(MarketDataService {
            inner: Arc::new(ServiceInner {
                registry: ProviderRegistry::new(providers, self.metrics.health_window),
                cache: ResponseCache::new(self.cache.max_entries, self.cache.shards),
                dedup: RequestDeduplicator::new(),
                metrics: MetricsCollector::new(self.metrics, self.sinks),
                cache_config: self.cache,
                provider_timeout: self.provider_timeout,
                request_timeout: self.request_timeout,
                dedup_wait: self.dedup_wait,
                not_found_policy: self.not_found_policy,
            }),
        })
    }
}

/// How a call was served, for its [`CallRecord`].
#[derive(Default)]
struct CallPath {
    attempts: Vec<ProviderAttempt>,
    cache_hit: bool,
    fallback_used: bool,
    deduplicated: bool,
}

impl CallPath {
    fn from_cache() -> Self {
        Self {
            cache_hit: true,
            ..Self::default()
        }
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}

impl MarketDataService {
    /// Start building a new service.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use mercato::{MarketDataService, ProviderConfig};
    ///
    /// let svc = MarketDataService::builder()
    ///     .with_provider(Arc::new(primary), ProviderConfig::new("primary", 10))
    ///     .with_provider(Arc::new(backup), ProviderConfig::new("backup", 20).with_requests_per_minute(5))
    ///     .request_timeout(std::time::Duration::from_secs(5))
    ///     .build()?;
    /// let quote = svc.get_quote("AAPL").await?;
    /// ```
    #[must_use]
    pub fn builder() -> MarketDataServiceBuilder {
        MarketDataServiceBuilder::new()
    }

    /// Build a service straight from configuration.
    ///
    /// # Errors
    /// See [`MarketDataServiceBuilder::with_config`] and [`MarketDataServiceBuilder::build`].
    pub fn from_config(
        config: ServiceConfig,
        factory: &ProviderFactory,
    ) -> Result<Self, MercatoError> {
        MarketDataServiceBuilder::new()
            .with_config(config, factory)?
            .build()
    }

    /// Bound one adapter call by `until`, mapping expiry to `ProviderTimeout`.
    ///
    /// `None` awaits the call without a bound.
    #[tracing::instrument(
        name = "mercato::service::provider_call",
        skip_all,
        fields(provider = provider, data_type = %data_type),
    )]
    pub(crate) async fn provider_call_until<T, Fut>(
        provider: &str,
        data_type: DataType,
        until: Option<Instant>,
        fut: Fut,
    ) -> Result<T, MercatoError>
    where
        Fut: core::future::Future<Output = Result<T, MercatoError>>,
    {
        let Some(until) = until else {
            return fut.await;
        };
        (tokio::time::timeout_at(until, fut).await)
            .unwrap_or_else(|_| Err(MercatoError::provider_timeout(provider, data_type)))
    }

    /// Fetch any request through cache, deduplication and provider fallback.
    ///
    /// The typed `get_*` operations are thin wrappers over this.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an empty symbol, `Unsupported` when no provider
    /// serves the data type, `NoEligibleProviders` when all of them are cooling
    /// down, `RequestTimeout` when the deadline elapses, the dedup wait errors
    /// for followers, and otherwise the collapsed provider failures.
    #[tracing::instrument(
        target = "mercato::service",
        skip(self, request, opts),
        fields(
            data_type = %request.data_type(),
            symbol = %request.symbol(),
            key = tracing::field::Empty,
        ),
    )]
    pub async fn fetch(
        &self,
        request: &DataRequest,
        opts: &CallOptions,
    ) -> Result<MarketData, MercatoError> {
        let req = request.normalized()?;
        let key = req.key();
        tracing::Span::current().record("key", tracing::field::display(&key));

        let started = Instant::now();
        let inner = &self.inner;
        // A bound too large for the clock means no bound.
        let deadline = opts
            .deadline
            .or(inner.request_timeout)
            .and_then(|d| started.checked_add(d));

        if let Some(hit) = inner.cache.get(&key) {
            let res = Ok(hit);
            self.record(&req, &key, started, CallPath::from_cache(), &res);
            return res;
        }

        let (res, path) = match inner.dedup.join(key.clone()) {
            Role::Follower(follower) => {
                let mut wait = opts.dedup_wait.or(inner.dedup_wait);
                if let Some(d) = deadline {
                    let left = d.saturating_duration_since(Instant::now());
                    wait = Some(wait.map_or(left, |w| w.min(left)));
                }
                tracing::debug!(target: "mercato::service", "awaiting in-flight request");
                let res = match follower.wait(wait).await {
                    Ok(shared) => shared,
                    Err(WaitError::TimedOut) => Err(MercatoError::DedupWaitTimeout {
                        key: key.to_string(),
                    }),
                    Err(WaitError::Abandoned) => Err(MercatoError::DedupLeaderAbandoned {
                        key: key.to_string(),
                    }),
                };
                let path = CallPath {
                    deduplicated: true,
                    ..CallPath::default()
                };
                (res, path)
            }
            Role::Leader(guard) => {
                if let Some(hit) = inner.cache.recheck(&key) {
                    guard.publish(Ok(hit.clone()));
                    (Ok(hit), CallPath::from_cache())
                } else {
                    let (res, path) = self.fetch_from_providers(&req, &key, deadline).await;
                    guard.publish(res.clone());
                    (res, path)
                }
            }
        };

        self.record(&req, &key, started, path, &res);
        res
    }

    async fn fetch_from_providers(
        &self,
        req: &DataRequest,
        key: &RequestKey,
        deadline: Option<Instant>,
    ) -> (Result<MarketData, MercatoError>, CallPath) {
        let inner = &self.inner;
        let data_type = req.data_type();
        let mut path = CallPath::default();

        if !inner.registry.supports(data_type) {
            return (Err(MercatoError::unsupported(data_type.as_str())), path);
        }
        let eligible = inner.registry.eligible(data_type);
        if eligible.is_empty() {
            tracing::warn!(target: "mercato::service", "every provider is cooling down");
            return (Err(MercatoError::NoEligibleProviders { data_type }), path);
        }

        let mut errors: Vec<MercatoError> = Vec::new();
        for (idx, entry) in eligible.iter().enumerate() {
            let now = Instant::now();
            let own_limit = now.checked_add(inner.provider_timeout);
            let (until, caller_bound) = match (deadline, own_limit) {
                (Some(d), _) if d <= now => {
                    let last_error = errors.last().cloned().map(Box::new);
                    let err = MercatoError::RequestTimeout {
                        data_type,
                        last_error,
                    };
                    return (Err(err), path);
                }
                (Some(d), Some(own)) if d < own => (Some(d), true),
                (Some(d), None) => (Some(d), true),
                (_, own) => (own, false),
            };

            let name = entry.name();
            let res = Self::provider_call_until(
                name,
                data_type,
                until,
                fetch_from(entry.adapter().as_ref(), req),
            )
            .await;
            let latency_ms = millis(now.elapsed());
            path.attempts.push(ProviderAttempt {
                provider: name.to_string(),
                latency_ms,
                failure: res.as_ref().err().map(MercatoError::kind),
            });

            match res {
                Ok(data) => {
                    entry.record_success();
                    let ttl = entry.ttl_for(data_type, &inner.cache_config);
                    inner.cache.put(key.clone(), data.clone(), ttl);
                    if idx > 0 {
                        path.fallback_used = true;
                        tracing::info!(
                            target: "mercato::service",
                            provider = name,
                            attempts = idx + 1,
                            "served by fallback provider"
                        );
                    }
                    return (Ok(data), path);
                }
                Err(MercatoError::ProviderTimeout { .. }) if caller_bound => {
                    tracing::warn!(
                        target: "mercato::service",
                        provider = name,
                        "request deadline elapsed; abandoning fallback"
                    );
                    let err = MercatoError::RequestTimeout {
                        data_type,
                        last_error: errors.last().cloned().map(Box::new),
                    };
                    return (Err(err), path);
                }
                Err(e) => {
                    tracing::debug!(
                        target: "mercato::service",
                        provider = name,
                        kind = e.kind().as_str(),
                        error = %e,
                        latency_ms,
                        "provider attempt failed"
                    );
                    entry.record_failure(&e);
                    let stop = matches!(e, MercatoError::NotFound { .. })
                        && inner.not_found_policy == NotFoundPolicy::StopOnNotFound;
                    errors.push(e);
                    if stop {
                        break;
                    }
                }
            }
        }

        (Err(collapse_errors(data_type, errors, req.describe())), path)
    }

    fn record(
        &self,
        req: &DataRequest,
        key: &RequestKey,
        started: Instant,
        path: CallPath,
        res: &Result<MarketData, MercatoError>,
    ) {
        let (outcome, provider_used, error) = match res {
            Ok(v) => (CallOutcome::Success, Some(v.source().to_string()), None),
            Err(e) => (CallOutcome::Failure, None, Some(e.clone())),
        };
        self.inner.metrics.record(CallRecord {
            timestamp: Utc::now(),
            data_type: req.data_type(),
            symbol: req.symbol().to_string(),
            key: key.to_string(),
            providers_tried: path.attempts.iter().map(|a| a.provider.clone()).collect(),
            provider_used,
            outcome,
            cache_hit: path.cache_hit,
            fallback_used: path.fallback_used,
            deduplicated: path.deduplicated,
            latency_ms: millis(started.elapsed()),
            attempts: path.attempts,
            error,
        });
    }
}
