// Shared fixtures for the service integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use mercato::{
    DataType, MarketDataService, MarketDataServiceBuilder, MercatoError, NaiveDate,
    ProviderAdapter, ProviderConfig,
};
use mercato_mock::{MockBehavior, MockProvider};

/// Common symbol constants used across tests.
pub const AAPL: &str = "AAPL";
pub const MSFT: &str = "MSFT";
pub const TSLA: &str = "TSLA";
pub const NVDA: &str = "NVDA";
pub const XYZ: &str = "XYZ";
/// Not present in any fixture.
pub const MISSING: &str = "ZZZZ";

/// Listed expiry in the option fixtures.
pub fn expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

/// Mock serving fixtures for every data type.
pub fn mock(name: &str) -> Arc<MockProvider> {
    Arc::new(MockProvider::new(name))
}

/// Mock whose every call fails with a provider error.
pub fn failing(name: &str) -> Arc<MockProvider> {
    let m = MockProvider::new(name);
    m.set_failing(true);
    Arc::new(m)
}

/// Mock that never answers `data_type`.
pub fn hanging(name: &str, data_type: DataType) -> Arc<MockProvider> {
    Arc::new(MockProvider::new(name).with_behavior(data_type, MockBehavior::Hang))
}

/// Mock failing `data_type` with a fixed error.
pub fn erroring(name: &str, data_type: DataType, err: MercatoError) -> Arc<MockProvider> {
    Arc::new(MockProvider::new(name).with_behavior(data_type, MockBehavior::Fail(err)))
}

/// Builder preloaded with `providers` under the given configs.
pub fn builder(providers: &[(&Arc<MockProvider>, ProviderConfig)]) -> MarketDataServiceBuilder {
    providers
        .iter()
        .fold(MarketDataService::builder(), |b, (m, cfg)| {
            let adapter: Arc<dyn ProviderAdapter> = (*m).clone();
            b.with_provider(adapter, cfg.clone())
        })
}

/// Service over `providers`, each registered under its name with the given priority.
pub fn service(providers: &[(&Arc<MockProvider>, u32)]) -> MarketDataService {
    let cfgs: Vec<(&Arc<MockProvider>, ProviderConfig)> = providers
        .iter()
        .map(|(m, prio)| (*m, ProviderConfig::new(m.name(), *prio)))
        .collect();
    builder(&cfgs).build().unwrap()
}

/// Route service logs to the test harness; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
