//! Provider health state machine types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MercatoError;

/// Gating status of a provider.
///
/// `Healthy` and `Degraded` providers are eligible. `Unhealthy` and
/// `RateLimited` providers are skipped until their cooldown elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    /// No recent failures.
    #[default]
    Healthy,
    /// Failing, but below the consecutive failure threshold.
    Degraded,
    /// Tripped by consecutive failures; cooling down.
    Unhealthy,
    /// Tripped by a rate limit; cooling down.
    RateLimited,
}

impl ProviderStatus {
    /// Stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
            Self::RateLimited => "rate_limited",
        }
    }
}

/// Mutable per-provider record owned by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderHealthState {
    /// Current gating status.
    pub status: ProviderStatus,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// Most recent failure.
    pub last_error: Option<MercatoError>,
    /// Wall-clock time of the most recent failure.
    pub last_error_time: Option<DateTime<Utc>>,
    /// Wall-clock end of the active cooldown, if any.
    pub cooldown_until: Option<DateTime<Utc>>,
}

/// Reporting-only classification derived from the rolling success rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthClassification {
    /// Success rate at or above 95%.
    Healthy,
    /// Success rate at or above 80%.
    Degraded,
    /// Anything lower.
    Unhealthy,
}

impl HealthClassification {
    /// Classify a success rate in `[0, 1]`. An empty window counts as healthy.
    #[must_use]
    pub fn from_success_rate(rate: Option<f64>) -> Self {
        match rate {
            None => Self::Healthy,
            Some(r) if r >= 0.95 => Self::Healthy,
            Some(r) if r >= 0.80 => Self::Degraded,
            Some(_) => Self::Unhealthy,
        }
    }
}

/// Point-in-time view of one provider's health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderHealthSnapshot {
    /// Provider name.
    pub name: String,
    /// Configured priority.
    pub priority: u32,
    /// Gating state.
    pub state: ProviderHealthState,
    /// Whether the provider would be tried right now.
    pub eligible: bool,
    /// Success rate over the rolling window, if any outcome was recorded.
    pub rolling_success_rate: Option<f64>,
    /// Outcomes currently in the rolling window.
    pub window_len: usize,
    /// Classification of `rolling_success_rate`.
    pub classification: HealthClassification,
}
