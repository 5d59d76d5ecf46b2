//! Configuration types shared across the service and provider factories.
//!
//! Everything here is read once at startup and treated as immutable afterwards.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data_type::DataType;
use crate::error::MercatoError;

/// Policy applied when a provider reports `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundPolicy {
    /// Keep walking the fallback chain; provider coverage differs.
    #[default]
    TryNextProvider,
    /// Treat the first `NotFound` as final for this request.
    StopOnNotFound,
}

/// Opaque provider credentials. Only adapters interpret the values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Inline API key.
    pub api_key: Option<String>,
    /// Environment variable holding the API key, consulted when `api_key` is unset.
    pub api_key_env: Option<String>,
    /// When true the provider is disabled unless a key resolves.
    pub required: bool,
    /// Additional provider-specific settings.
    pub extra: HashMap<String, String>,
}

/// Credentials after resolution against the environment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResolvedCredentials {
    /// API key, if one was found.
    pub api_key: Option<String>,
    /// Additional provider-specific settings.
    pub extra: HashMap<String, String>,
}

impl core::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CredentialsConfig {
    /// Resolve the key from the inline value, then the named environment variable.
    ///
    /// Returns `None` when `required` is set and no key could be found.
    #[must_use]
    pub fn resolve(&self) -> Option<ResolvedCredentials> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Like [`resolve`](Self::resolve) with an injectable environment lookup.
    pub fn resolve_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<ResolvedCredentials> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                self.api_key_env
                    .as_deref()
                    .and_then(&lookup)
                    .filter(|k| !k.trim().is_empty())
            });
        if self.required && api_key.is_none() {
            return None;
        }
        Some(ResolvedCredentials {
            api_key,
            extra: self.extra.clone(),
        })
    }
}

/// Static metadata for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Unique provider name; must match the adapter's `name()`.
    pub name: String,
    /// Try order; lower values are tried first. Ties keep registration order.
    pub priority: u32,
    /// Outbound budget enforced in front of the adapter, if set.
    pub requests_per_minute: Option<u32>,
    /// Cache TTL per data type, in seconds. Missing entries use the service default; 0 disables caching.
    pub cache_ttl_seconds: HashMap<DataType, u64>,
    /// Cooldown after reaching the consecutive failure threshold.
    pub cooldown_seconds: u64,
    /// Cooldown after a `RateLimited` error. Falls back to the error's retry hint, then `cooldown_seconds`.
    pub rate_limit_cooldown_seconds: Option<u64>,
    /// Consecutive failures that mark the provider unhealthy.
    pub consecutive_failure_threshold: u32,
    /// Disabled providers are never instantiated.
    pub enabled: bool,
    /// Credentials handed to the adapter factory.
    pub credentials: Option<CredentialsConfig>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            priority: 100,
            requests_per_minute: None,
            cache_ttl_seconds: HashMap::new(),
            cooldown_seconds: 60,
            rate_limit_cooldown_seconds: None,
            consecutive_failure_threshold: 3,
            enabled: true,
            credentials: None,
        }
    }
}

impl ProviderConfig {
    /// Minimal config with a name and priority; everything else defaulted.
    pub fn new(name: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            priority,
            ..Self::default()
        }
    }

    /// Builder-style TTL override for one data type.
    #[must_use]
    pub fn with_ttl(mut self, data_type: DataType, seconds: u64) -> Self {
        self.cache_ttl_seconds.insert(data_type, seconds);
        self
    }

    /// Builder-style cooldown override.
    #[must_use]
    pub const fn with_cooldown(mut self, seconds: u64) -> Self {
        self.cooldown_seconds = seconds;
        self
    }

    /// Builder-style failure threshold override.
    #[must_use]
    pub const fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.consecutive_failure_threshold = threshold;
        self
    }

    /// Builder-style rate limit.
    #[must_use]
    pub const fn with_requests_per_minute(mut self, rpm: u32) -> Self {
        self.requests_per_minute = Some(rpm);
        self
    }

    /// The configured cooldown as a `Duration`.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}

/// Cache sizing and default TTLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Total entry budget across all shards.
    pub max_entries: usize,
    /// Number of independently locked shards.
    pub shards: usize,
    /// TTL per data type, in seconds, used when a provider has no override.
    pub default_ttl_seconds: HashMap<DataType, u64>,
}

impl CacheConfig {
    /// Built-in TTL for a data type.
    #[must_use]
    pub const fn builtin_ttl_seconds(data_type: DataType) -> u64 {
        match data_type {
            DataType::Quote => 60,
            DataType::OptionsChain => 300,
            DataType::History | DataType::OptionsExpirations => 3_600,
            DataType::Info | DataType::Fundamentals | DataType::Earnings | DataType::Macro => {
                86_400
            }
        }
    }

    /// Default TTL for a data type (configured value, else built-in).
    #[must_use]
    pub fn default_ttl(&self, data_type: DataType) -> Duration {
        let secs = self
            .default_ttl_seconds
            .get(&data_type)
            .copied()
            .unwrap_or_else(|| Self::builtin_ttl_seconds(data_type));
        Duration::from_secs(secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            shards: 16,
            default_ttl_seconds: HashMap::new(),
        }
    }
}

/// Bounds for the metrics collector's retained windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Call records retained for `get_recent_calls`.
    pub recent_calls_capacity: usize,
    /// Latency samples retained for percentile computation.
    pub latency_window: usize,
    /// Outcomes per provider retained for health classification.
    pub health_window: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            recent_calls_capacity: 1_000,
            latency_window: 5_000,
            health_window: 100,
        }
    }
}

/// Global configuration for the market data service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Provider metadata; order in this list only breaks priority ties.
    pub providers: Vec<ProviderConfig>,
    /// Cache sizing and default TTLs.
    pub cache: CacheConfig,
    /// Metrics retention.
    pub metrics: MetricsConfig,
    /// Timeout for each individual adapter call.
    pub provider_timeout_ms: u64,
    /// Default overall deadline per request (covers every fallback attempt).
    pub request_timeout_ms: Option<u64>,
    /// Default bound on how long a deduplicated follower waits for its leader.
    pub dedup_wait_timeout_ms: Option<u64>,
    /// What a `NotFound` means for the rest of the fallback chain.
    pub not_found_policy: NotFoundPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            cache: CacheConfig::default(),
            metrics: MetricsConfig::default(),
            provider_timeout_ms: 10_000,
            request_timeout_ms: None,
            dedup_wait_timeout_ms: Some(30_000),
            not_found_policy: NotFoundPolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    /// Returns `Config` when the document does not parse or fails validation.
    pub fn from_json_str(s: &str) -> Result<Self, MercatoError> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| MercatoError::Config(format!("parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    ///
    /// # Errors
    /// Returns `Config` when the file cannot be read, parsed or validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MercatoError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MercatoError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Check structural invariants.
    ///
    /// # Errors
    /// Returns `Config` for empty or duplicate provider names, a zero failure
    /// threshold, or a zero cache capacity.
    pub fn validate(&self) -> Result<(), MercatoError> {
        let mut seen = HashSet::new();
        for p in &self.providers {
            if p.name.trim().is_empty() {
                return Err(MercatoError::Config("provider with empty name".into()));
            }
            if !seen.insert(p.name.as_str()) {
                return Err(MercatoError::Config(format!(
                    "duplicate provider name: {}",
                    p.name
                )));
            }
            if p.consecutive_failure_threshold == 0 {
                return Err(MercatoError::Config(format!(
                    "{}: consecutive_failure_threshold must be at least 1",
                    p.name
                )));
            }
            if p.requests_per_minute == Some(0) {
                return Err(MercatoError::Config(format!(
                    "{}: requests_per_minute must be positive when set",
                    p.name
                )));
            }
        }
        if self.cache.max_entries == 0 {
            return Err(MercatoError::Config("cache.max_entries must be positive".into()));
        }
        Ok(())
    }

    /// Look up a provider's configuration by name.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Per-adapter call timeout.
    #[must_use]
    pub const fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Default overall request deadline.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Default follower wait bound.
    #[must_use]
    pub fn dedup_wait_timeout(&self) -> Option<Duration> {
        self.dedup_wait_timeout_ms.map(Duration::from_millis)
    }
}
