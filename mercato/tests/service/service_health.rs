use std::time::Duration;

use mercato::{DataType, HealthClassification, MercatoError, ProviderConfig, ProviderStatus};

use crate::helpers::{AAPL, MSFT, NVDA, TSLA, XYZ, builder, erroring, failing, mock, service};

#[tokio::test(start_paused = true)]
async fn unhealthy_provider_sits_out_its_cooldown() {
    let p1 = failing("p1");
    let p2 = mock("p2");
    let svc = builder(&[
        (
            &p1,
            ProviderConfig::new("p1", 1).with_failure_threshold(2).with_cooldown(30),
        ),
        (&p2, ProviderConfig::new("p2", 2)),
    ])
    .build()
    .unwrap();

    svc.get_quote(AAPL).await.unwrap();
    assert_eq!(
        svc.get_provider_health("p1").unwrap().state.status,
        ProviderStatus::Degraded
    );
    svc.get_quote(MSFT).await.unwrap();
    let h = svc.get_provider_health("p1").unwrap();
    assert_eq!(h.state.status, ProviderStatus::Unhealthy);
    assert!(h.state.cooldown_until.is_some());
    assert!(!h.eligible);

    // Excluded: p2 is now the first eligible provider, so no fallback.
    svc.get_quote(TSLA).await.unwrap();
    assert_eq!(p1.calls(DataType::Quote), 2);
    let rec = &svc.get_recent_calls(1, None, false)[0];
    assert_eq!(rec.providers_tried, vec!["p2"]);
    assert!(!rec.fallback_used);

    tokio::time::advance(Duration::from_secs(30)).await;
    p1.set_failing(false);
    let q = svc.get_quote(NVDA).await.unwrap();
    assert_eq!(q.source, "p1");
    let h = svc.get_provider_health("p1").unwrap();
    assert_eq!(h.state.status, ProviderStatus::Healthy);
    assert_eq!(h.state.consecutive_failures, 0);
}

#[tokio::test]
async fn success_resets_the_failure_streak() {
    let p1 = failing("p1");
    let p2 = mock("p2");
    let svc = builder(&[
        (&p1, ProviderConfig::new("p1", 1).with_failure_threshold(3)),
        (&p2, ProviderConfig::new("p2", 2)),
    ])
    .build()
    .unwrap();

    svc.get_quote(AAPL).await.unwrap();
    svc.get_quote(MSFT).await.unwrap();
    p1.set_failing(false);
    svc.get_quote(TSLA).await.unwrap();
    p1.set_failing(true);
    svc.get_quote(NVDA).await.unwrap();

    let h = svc.get_provider_health("p1").unwrap();
    assert_eq!(h.state.consecutive_failures, 1);
    assert_eq!(h.state.status, ProviderStatus::Degraded);
    assert!(h.eligible);
    assert_eq!(h.window_len, 4);
    assert_eq!(h.rolling_success_rate, Some(0.25));
    assert_eq!(h.classification, HealthClassification::Unhealthy);
}

#[tokio::test]
async fn nothing_eligible_once_every_provider_cools_down() {
    let only = failing("only");
    let svc = builder(&[(
        &only,
        ProviderConfig::new("only", 1).with_failure_threshold(1),
    )])
    .build()
    .unwrap();

    let first = svc.get_quote(AAPL).await.unwrap_err();
    assert!(matches!(first, MercatoError::AllProvidersFailed { .. }), "{first:?}");
    let second = svc.get_quote(MSFT).await.unwrap_err();
    assert!(
        matches!(second, MercatoError::NoEligibleProviders { data_type: DataType::Quote }),
        "{second:?}"
    );
    assert_eq!(only.calls(DataType::Quote), 1);
}

#[tokio::test(start_paused = true)]
async fn upstream_rate_limit_honors_retry_after() {
    let p1 = erroring("p1", DataType::Quote, MercatoError::rate_limited("p1", Some(5_000)));
    let p2 = mock("p2");
    let svc = service(&[(&p1, 1), (&p2, 2)]);

    assert_eq!(svc.get_quote(AAPL).await.unwrap().source, "p2");
    let h = svc.get_provider_health("p1").unwrap();
    assert_eq!(h.state.status, ProviderStatus::RateLimited);
    assert!(!h.eligible);

    svc.get_quote(MSFT).await.unwrap();
    assert_eq!(p1.calls(DataType::Quote), 1);

    tokio::time::advance(Duration::from_secs(5)).await;
    p1.clear_behavior(DataType::Quote);
    assert_eq!(svc.get_quote(TSLA).await.unwrap().source, "p1");
}

#[tokio::test(start_paused = true)]
async fn configured_rate_limit_cooldown_overrides_retry_after() {
    let p1 = erroring("p1", DataType::Quote, MercatoError::rate_limited("p1", Some(1_000)));
    let p2 = mock("p2");
    let mut cfg = ProviderConfig::new("p1", 1);
    cfg.rate_limit_cooldown_seconds = Some(120);
    let svc = builder(&[(&p1, cfg), (&p2, ProviderConfig::new("p2", 2))])
        .build()
        .unwrap();

    svc.get_quote(AAPL).await.unwrap();
    p1.clear_behavior(DataType::Quote);

    tokio::time::advance(Duration::from_secs(60)).await;
    assert_eq!(svc.get_quote(MSFT).await.unwrap().source, "p2");
    tokio::time::advance(Duration::from_secs(60)).await;
    assert_eq!(svc.get_quote(TSLA).await.unwrap().source, "p1");
}

#[tokio::test(start_paused = true)]
async fn local_request_budget_puts_provider_in_rate_limited_state() {
    let p1 = mock("p1");
    let p2 = mock("p2");
    let svc = builder(&[
        (&p1, ProviderConfig::new("p1", 1).with_requests_per_minute(2)),
        (&p2, ProviderConfig::new("p2", 2)),
    ])
    .build()
    .unwrap();

    assert_eq!(svc.get_quote(AAPL).await.unwrap().source, "p1");
    assert_eq!(svc.get_quote(MSFT).await.unwrap().source, "p1");
    // Budget spent: the limiter rejects before the adapter is reached.
    assert_eq!(svc.get_quote(TSLA).await.unwrap().source, "p2");
    assert_eq!(p1.calls(DataType::Quote), 2);

    let h = svc.get_provider_health("p1").unwrap();
    assert_eq!(h.state.status, ProviderStatus::RateLimited);
    assert!(matches!(
        h.state.last_error,
        Some(MercatoError::RateLimited { retry_after_ms: Some(_), .. })
    ));

    tokio::time::advance(Duration::from_secs(61)).await;
    assert_eq!(svc.get_quote(XYZ).await.unwrap().source, "p1");
}

#[tokio::test]
async fn health_listing_follows_priority() {
    let a = mock("a");
    let b = mock("b");
    let c = mock("c");
    let svc = service(&[(&c, 30), (&a, 10), (&b, 20)]);

    let names: Vec<String> = svc
        .get_all_provider_health()
        .into_iter()
        .map(|h| h.name)
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert!(svc.get_provider_health("nope").is_none());

    let fresh = svc.get_provider_health("a").unwrap();
    assert_eq!(fresh.state.status, ProviderStatus::Healthy);
    assert_eq!(fresh.rolling_success_rate, None);
}
