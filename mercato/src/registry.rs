//! Provider registry: static ordering plus the per-provider health state machine.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use mercato_core::{
    CacheConfig, DataType, HealthClassification, MercatoError, ProviderAdapter, ProviderConfig,
    ProviderHealthSnapshot, ProviderHealthState, ProviderStatus,
};
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

// Longest cooldown handed to the clock; larger values are clamped.
const MAX_COOLDOWN: Duration = Duration::from_secs(100 * 365 * 86_400);

#[derive(Debug, Default)]
struct HealthCell {
    state: ProviderHealthState,
    cooldown_deadline: Option<Instant>,
}

/// One registered adapter with its configuration and health.
pub struct ProviderEntry {
    adapter: Arc<dyn ProviderAdapter>,
    config: ProviderConfig,
    health: RwLock<HealthCell>,
    window: Mutex<VecDeque<bool>>,
    window_cap: usize,
}

impl ProviderEntry {
    fn new(adapter: Arc<dyn ProviderAdapter>, config: ProviderConfig, window_cap: usize) -> Self {
        Self {
            adapter,
            config,
            health: RwLock::new(HealthCell::default()),
            window: Mutex::new(VecDeque::with_capacity(window_cap.min(1_024))),
            window_cap: window_cap.max(1),
        }
    }

    /// Provider name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The (possibly wrapped) adapter.
    pub fn adapter(&self) -> &Arc<dyn ProviderAdapter> {
        &self.adapter
    }

    /// Static configuration.
    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Whether this provider may be tried right now.
    ///
    /// An elapsed cooldown returns the provider to `Healthy` on the spot.
    pub fn is_eligible(&self) -> bool {
        let now = Instant::now();
        match self.health.read().cooldown_deadline {
            None => return true,
            Some(deadline) if now < deadline => return false,
            Some(_) => {}
        }
        let mut cell = self.health.write();
        if cell.cooldown_deadline.is_some_and(|d| now >= d) {
            let from = cell.state.status;
            cell.cooldown_deadline = None;
            cell.state.cooldown_until = None;
            cell.state.consecutive_failures = 0;
            cell.state.status = ProviderStatus::Healthy;
            tracing::info!(
                target: "mercato::registry",
                provider = %self.config.name,
                from = from.as_str(),
                "cooldown elapsed; provider eligible again"
            );
        }
        true
    }

    /// Record a successful attempt.
    pub fn record_success(&self) {
        self.push_outcome(true);
        let mut cell = self.health.write();
        if cell.state.status != ProviderStatus::Healthy {
            tracing::info!(
                target: "mercato::registry",
                provider = %self.config.name,
                from = cell.state.status.as_str(),
                "provider recovered"
            );
        }
        cell.state.consecutive_failures = 0;
        cell.state.status = ProviderStatus::Healthy;
        cell.state.cooldown_until = None;
        cell.cooldown_deadline = None;
    }

    /// Record a failed attempt and apply the matching transition.
    ///
    /// `NotFound` means the provider answered and has no data, so it is
    /// recorded as a success for health purposes.
    pub fn record_failure(&self, err: &MercatoError) {
        if matches!(err, MercatoError::NotFound { .. }) {
            self.record_success();
            return;
        }
        self.push_outcome(false);

        let mut cell = self.health.write();
        cell.state.consecutive_failures = cell.state.consecutive_failures.saturating_add(1);
        cell.state.last_error = Some(err.clone());
        cell.state.last_error_time = Some(Utc::now());

        if let MercatoError::RateLimited { retry_after_ms, .. } = err {
            let cooldown = self
                .config
                .rate_limit_cooldown_seconds
                .map(Duration::from_secs)
                .or_else(|| retry_after_ms.map(Duration::from_millis))
                .unwrap_or_else(|| self.config.cooldown());
            Self::start_cooldown(&mut cell, ProviderStatus::RateLimited, cooldown);
            tracing::warn!(
                target: "mercato::registry",
                provider = %self.config.name,
                cooldown_ms = u64::try_from(cooldown.as_millis()).unwrap_or(u64::MAX),
                "provider rate limited; cooling down"
            );
            return;
        }

        if cell.state.consecutive_failures >= self.config.consecutive_failure_threshold {
            let cooldown = self.config.cooldown();
            Self::start_cooldown(&mut cell, ProviderStatus::Unhealthy, cooldown);
            tracing::warn!(
                target: "mercato::registry",
                provider = %self.config.name,
                consecutive_failures = cell.state.consecutive_failures,
                cooldown_s = self.config.cooldown_seconds,
                "provider unhealthy; cooling down"
            );
        } else {
            cell.state.status = ProviderStatus::Degraded;
        }
    }

    fn start_cooldown(cell: &mut HealthCell, status: ProviderStatus, cooldown: Duration) {
        let now = Instant::now();
        cell.state.status = status;
        let cooldown = cooldown.min(MAX_COOLDOWN);
        cell.cooldown_deadline = now.checked_add(cooldown).or(Some(now));
        cell.state.cooldown_until = TimeDelta::from_std(cooldown)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d));
    }

    fn push_outcome(&self, ok: bool) {
        let mut w = self.window.lock();
        if w.len() == self.window_cap {
            w.pop_front();
        }
        w.push_back(ok);
    }

    /// Current gating state.
    pub fn state(&self) -> ProviderHealthState {
        self.health.read().state.clone()
    }

    /// Point-in-time health view.
    pub fn snapshot(&self) -> ProviderHealthSnapshot {
        let eligible = self.is_eligible();
        let state = self.state();
        let (window_len, rolling_success_rate) = {
            let w = self.window.lock();
            let ok = w.iter().filter(|o| **o).count();
            let rate = (!w.is_empty()).then(|| ok as f64 / w.len() as f64);
            (w.len(), rate)
        };
        ProviderHealthSnapshot {
            name: self.config.name.clone(),
            priority: self.config.priority,
            state,
            eligible,
            rolling_success_rate,
            window_len,
            classification: HealthClassification::from_success_rate(rolling_success_rate),
        }
    }

    /// Cache TTL for values this provider returns for `data_type`.
    ///
    /// A zero duration means the value must not be cached.
    pub fn ttl_for(&self, data_type: DataType, cache: &CacheConfig) -> Duration {
        self.config
            .cache_ttl_seconds
            .get(&data_type)
            .map_or_else(|| cache.default_ttl(data_type), |s| Duration::from_secs(*s))
    }
}

/// Priority-ordered, immutable set of providers.
pub struct ProviderRegistry {
    entries: Vec<ProviderEntry>,
}

impl ProviderRegistry {
    /// Register providers, ordered by ascending priority. Ties keep the given order.
    pub fn new(
        providers: impl IntoIterator<Item = (Arc<dyn ProviderAdapter>, ProviderConfig)>,
        health_window: usize,
    ) -> Self {
        let mut entries: Vec<ProviderEntry> = providers
            .into_iter()
            .map(|(a, c)| ProviderEntry::new(a, c, health_window))
            .collect();
        entries.sort_by_key(|e| e.config.priority);
        Self { entries }
    }

    /// Every provider, in priority order.
    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }

    /// Number of providers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<&ProviderEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Whether any provider implements `data_type`, regardless of health.
    pub fn supports(&self, data_type: DataType) -> bool {
        self.entries.iter().any(|e| e.adapter.supports(data_type))
    }

    /// Providers to try for `data_type` right now, in priority order.
    pub fn eligible(&self, data_type: DataType) -> Vec<&ProviderEntry> {
        self.entries
            .iter()
            .filter(|e| e.adapter.supports(data_type) && e.is_eligible())
            .collect()
    }

    /// Health of one provider.
    pub fn snapshot(&self, name: &str) -> Option<ProviderHealthSnapshot> {
        self.get(name).map(ProviderEntry::snapshot)
    }

    /// Health of every provider, in priority order.
    pub fn snapshots(&self) -> Vec<ProviderHealthSnapshot> {
        self.entries.iter().map(ProviderEntry::snapshot).collect()
    }
}
