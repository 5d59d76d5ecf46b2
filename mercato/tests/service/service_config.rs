use std::io::Write;
use std::sync::{Arc, Mutex};

use mercato::{
    DataType, MarketDataService, MercatoError, ProviderAdapter, ProviderConfig, ProviderFactory,
    ServiceConfig,
};
use mercato_mock::MockProvider;

use crate::helpers::{AAPL, builder, mock};

const CONFIG: &str = r#"{
    "provider_timeout_ms": 2000,
    "providers": [
        { "name": "backup", "priority": 20, "cache_ttl_seconds": { "quote": 5 } },
        { "name": "primary", "priority": 10,
          "credentials": { "api_key": "inline-key" } },
        { "name": "premium", "priority": 1,
          "credentials": { "api_key_env": "MERCATO_TEST_KEY_NEVER_SET", "required": true } },
        { "name": "retired", "priority": 5, "enabled": false }
    ]
}"#;

fn mock_factory(seen_keys: Arc<Mutex<Vec<(String, Option<String>)>>>) -> ProviderFactory {
    let mut factory = ProviderFactory::new();
    for name in ["backup", "primary", "premium", "retired"] {
        let seen = Arc::clone(&seen_keys);
        factory = factory.register(name, move |cfg, creds| {
            seen.lock()
                .unwrap()
                .push((cfg.name.clone(), creds.and_then(|c| c.api_key.clone())));
            Ok(Arc::new(MockProvider::new(cfg.name.clone())) as Arc<dyn ProviderAdapter>)
        });
    }
    factory
}

#[tokio::test]
async fn config_builds_enabled_providers_with_credentials() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let cfg = ServiceConfig::from_json_str(CONFIG).unwrap();
    let svc = MarketDataService::from_config(cfg, &mock_factory(Arc::clone(&seen))).unwrap();

    let names: Vec<String> = svc
        .get_all_provider_health()
        .into_iter()
        .map(|h| h.name)
        .collect();
    assert_eq!(names, vec!["primary", "backup"]);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            ("backup".to_string(), None),
            ("primary".to_string(), Some("inline-key".to_string())),
        ]
    );

    assert_eq!(svc.get_quote(AAPL).await.unwrap().source, "primary");
}

#[tokio::test]
async fn unregistered_provider_name_fails_startup() {
    let cfg = ServiceConfig::from_json_str(
        r#"{ "providers": [ { "name": "mystery", "priority": 1 } ] }"#,
    )
    .unwrap();
    let err = MarketDataService::from_config(cfg, &ProviderFactory::new())
        .err()
        .unwrap();
    assert!(matches!(err, MercatoError::Config(_)), "{err:?}");
}

#[tokio::test]
async fn config_with_only_skipped_providers_has_nothing_to_serve() {
    let cfg = ServiceConfig::from_json_str(
        r#"{ "providers": [ { "name": "retired", "priority": 1, "enabled": false } ] }"#,
    )
    .unwrap();
    let err = MarketDataService::from_config(cfg, &mock_factory(Arc::default()))
        .err()
        .unwrap();
    assert!(matches!(err, MercatoError::InvalidArg(_)), "{err:?}");
}

#[test]
fn builder_rejects_inconsistent_registrations() {
    let err = MarketDataService::builder().build().err().unwrap();
    assert!(matches!(err, MercatoError::InvalidArg(_)));

    let a = mock("a");
    let err = builder(&[(&a, ProviderConfig::new("b", 1))])
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, MercatoError::Config(_)), "{err:?}");

    let again = mock("a");
    let err = builder(&[(&a, ProviderConfig::new("a", 1)), (&again, ProviderConfig::new("a", 2))])
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, MercatoError::Config(_)), "{err:?}");
}

#[tokio::test(start_paused = true)]
async fn provider_ttl_from_config_overrides_the_default() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    let mut cfg = ServiceConfig::from_json_file(file.path()).unwrap();
    cfg.providers.retain(|p| p.name == "backup");
    let svc = MarketDataService::from_config(cfg, &mock_factory(seen)).unwrap();

    svc.get_quote(AAPL).await.unwrap();
    tokio::time::advance(std::time::Duration::from_secs(6)).await;
    svc.get_quote(AAPL).await.unwrap();

    let recent = svc.get_recent_calls(2, Some(DataType::Quote), false);
    assert!(recent.iter().all(|r| !r.cache_hit));
}
