//! Mercato serves market data from several unreliable providers behind one façade.
//!
//! Overview
//! - Providers implement the `mercato_core` adapter contracts and are tried in
//!   ascending priority, one at a time, skipping any that are cooling down.
//! - Successful values are cached per (data type, symbol, parameters) with the
//!   answering provider's TTL.
//! - Concurrent identical requests share a single upstream fetch.
//! - Every call is recorded; stats, latency percentiles, provider health and a
//!   recent-call log are available on demand.
//!
//! Key behaviors and trade-offs
//! - Health: consecutive failures past a provider's threshold, or any rate
//!   limit, start a cooldown during which the provider is skipped. It comes
//!   back as healthy once the cooldown elapses.
//! - `NotFound`: by default the next provider is still tried, because coverage
//!   differs between providers. [`NotFoundPolicy::StopOnNotFound`] makes the first
//!   `NotFound` final. A `NotFound` never counts against provider health.
//! - Deadlines: a per-provider timeout bounds each attempt; an optional overall
//!   deadline abandons remaining fallbacks and returns `RequestTimeout`.
//! - Deduplicated followers bound their own wait without cancelling the leader.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use mercato::{MarketDataService, ProviderConfig, DataType};
//!
//! let svc = MarketDataService::builder()
//!     .with_provider(primary, ProviderConfig::new("primary", 10).with_ttl(DataType::Quote, 15))
//!     .with_provider(backup, ProviderConfig::new("backup", 20).with_requests_per_minute(5))
//!     .build()?;
//!
//! let quote = svc.get_quote("AAPL").await?;
//! let stats = svc.get_stats();
//! let failures = svc.get_recent_calls(20, None, true);
//! ```
//!
//! Config-driven startup:
//! ```rust,ignore
//! let factory = mercato::ProviderFactory::new()
//!     .register("primary", |cfg, creds| Ok(Arc::new(Primary::new(cfg, creds)?) as _));
//! let svc = MarketDataService::from_config(ServiceConfig::from_json_file("mercato.json")?, &factory)?;
//! ```
#![warn(missing_docs)]

pub mod cache;
mod core;
pub mod dedup;
mod factory;
pub mod metrics;
pub mod registry;
mod router;
mod telemetry;

pub use crate::core::{CallOptions, MarketDataService, MarketDataServiceBuilder};
pub use cache::{CacheEntry, ResponseCache};
pub use dedup::{Follower, LeaderGuard, RequestDeduplicator, Role, WaitError};
pub use factory::ProviderFactory;
pub use metrics::{CallSink, JsonLineSink, MemorySink, MetricsCollector, TracingSink};
pub use registry::{ProviderEntry, ProviderRegistry};

pub use mercato_core::{Middleware, ProviderAdapter, fetch_from};
pub use mercato_middleware::{RateLimitMiddleware, RateLimitedAdapter, RateLimiter};
pub use mercato_types::*;
