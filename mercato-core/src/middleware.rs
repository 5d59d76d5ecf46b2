use std::sync::Arc;

use crate::adapter::ProviderAdapter;

/// Trait implemented by adapter wrappers (rate limiting, instrumentation, ...).
///
/// A middleware consumes its configuration and returns the wrapped adapter.
/// The wrapper must keep the inner adapter's `name()` so registry lookups
/// and metrics stay keyed by provider.
pub trait Middleware: Send + Sync {
    /// Wrap `inner` and return the wrapped adapter.
    fn apply(self: Box<Self>, inner: Arc<dyn ProviderAdapter>) -> Arc<dyn ProviderAdapter>;

    /// Human-readable middleware name for introspection/logging.
    fn name(&self) -> &'static str;

    /// Opaque configuration snapshot for serialization/inspection.
    fn config_json(&self) -> serde_json::Value;
}
