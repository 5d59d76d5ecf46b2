use std::sync::Arc;
use std::time::Duration;

use mercato::{
    MarketDataService, MercatoError, ProviderAdapter, ProviderConfig, ProviderFactory, TracingSink,
};
use mercato_mock::MockProvider;

/// Factory that backs every provider name with a [`MockProvider`].
///
/// A provider whose config carries `"extra": { "fail": "true" }` in its
/// credentials block fails every call, which lets a demo force a fallback
/// from configuration alone.
#[must_use]
pub fn mock_factory(names: &[&str]) -> ProviderFactory {
    names.iter().fold(ProviderFactory::new(), |f, name| {
        f.register(*name, |cfg, creds| {
            let mock = MockProvider::new(cfg.name.clone()).with_delay(Duration::from_millis(15));
            if creds.is_some_and(|c| c.extra.get("fail").is_some_and(|v| v == "true")) {
                mock.set_failing(true);
            }
            Ok(Arc::new(mock) as Arc<dyn ProviderAdapter>)
        })
    })
}

/// Two-provider service over healthy mocks, logging every call through `tracing`.
///
/// # Errors
/// Propagates builder validation errors.
pub fn simple_service() -> Result<MarketDataService, MercatoError> {
    MarketDataService::builder()
        .with_provider(Arc::new(MockProvider::new("primary")), ProviderConfig::new("primary", 10))
        .with_provider(Arc::new(MockProvider::new("backup")), ProviderConfig::new("backup", 20))
        .with_call_sink(Arc::new(TracingSink))
        .build()
}
