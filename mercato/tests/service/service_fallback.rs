use std::time::Duration;

use mercato::{DataType, DataTypes, FailureKind, MercatoError, NotFoundPolicy, ProviderConfig};
use mercato_mock::MockProvider;

use crate::helpers::{
    AAPL, MISSING, MSFT, TSLA, builder, erroring, failing, hanging, init_tracing, mock, service,
};

#[tokio::test]
async fn falls_back_in_priority_order() {
    init_tracing();
    let p10 = failing("p10");
    let p15 = failing("p15");
    let p20 = mock("p20");
    // Registration order is deliberately scrambled.
    let svc = builder(&[
        (&p20, ProviderConfig::new("p20", 20)),
        (&p10, ProviderConfig::new("p10", 10)),
        (&p15, ProviderConfig::new("p15", 15)),
    ])
    .with_call_sink(std::sync::Arc::new(mercato::TracingSink))
    .build()
    .unwrap();

    let q = svc.get_quote(AAPL).await.unwrap();
    assert_eq!(q.source, "p20");

    let rec = &svc.get_recent_calls(1, None, false)[0];
    assert_eq!(rec.providers_tried, vec!["p10", "p15", "p20"]);
    assert_eq!(rec.provider_used.as_deref(), Some("p20"));
    assert!(rec.fallback_used);
    assert_eq!(rec.attempts.len(), 3);
    assert_eq!(rec.attempts[0].failure, Some(FailureKind::Provider));
    assert_eq!(rec.attempts[2].failure, None);

    let health = |n: &str| svc.get_provider_health(n).unwrap().state.consecutive_failures;
    assert_eq!(health("p10"), 1);
    assert_eq!(health("p15"), 1);
    assert_eq!(health("p20"), 0);
    assert_eq!(svc.get_stats().totals.fallbacks, 1);
}

#[tokio::test]
async fn first_provider_success_is_not_a_fallback() {
    let a = mock("a");
    let b = mock("b");
    let svc = service(&[(&a, 1), (&b, 2)]);

    svc.get_quote(AAPL).await.unwrap();
    let rec = &svc.get_recent_calls(1, None, false)[0];
    assert!(!rec.fallback_used);
    assert_eq!(rec.providers_tried, vec!["a"]);
    assert_eq!(b.total_calls(), 0);
}

#[tokio::test]
async fn not_found_moves_on_by_default() {
    let a = erroring("a", DataType::Quote, MercatoError::not_found("quote for AAPL"));
    let b = mock("b");
    let svc = service(&[(&a, 1), (&b, 2)]);

    let q = svc.get_quote(AAPL).await.unwrap();
    assert_eq!(q.source, "b");
    // NotFound does not count against the provider's health.
    assert_eq!(
        svc.get_provider_health("a").unwrap().state.consecutive_failures,
        0
    );
}

#[tokio::test]
async fn stop_on_not_found_ends_the_chain() {
    let a = erroring("a", DataType::Quote, MercatoError::not_found("quote for AAPL"));
    let b = mock("b");
    let svc = builder(&[(&a, ProviderConfig::new("a", 1)), (&b, ProviderConfig::new("b", 2))])
        .not_found_policy(NotFoundPolicy::StopOnNotFound)
        .build()
        .unwrap();

    let err = svc.get_quote(AAPL).await.unwrap_err();
    assert!(matches!(err, MercatoError::NotFound { .. }), "{err:?}");
    assert_eq!(b.calls(DataType::Quote), 0);
}

#[tokio::test]
async fn unknown_symbol_everywhere_collapses_to_not_found() {
    let a = mock("a");
    let b = mock("b");
    let svc = service(&[(&a, 1), (&b, 2)]);

    let err = svc.get_quote(MISSING).await.unwrap_err();
    match err {
        MercatoError::NotFound { what } => assert_eq!(what, "quote for ZZZZ"),
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(a.calls(DataType::Quote), 1);
    assert_eq!(b.calls(DataType::Quote), 1);
}

#[tokio::test]
async fn mixed_failures_keep_every_error() {
    let a = failing("a");
    let b = erroring("b", DataType::Quote, MercatoError::not_found("quote for AAPL"));
    let svc = service(&[(&a, 1), (&b, 2)]);

    let err = svc.get_quote(AAPL).await.unwrap_err();
    match &err {
        MercatoError::AllProvidersFailed { data_type, errors } => {
            assert_eq!(*data_type, DataType::Quote);
            assert_eq!(errors.len(), 2);
            assert!(matches!(errors[1], MercatoError::NotFound { .. }));
        }
        other => panic!("unexpected: {other:?}"),
    }
    let flat = err.flatten();
    assert_eq!(flat.len(), 2);
    assert!(matches!(flat[0], MercatoError::Provider { .. }), "{flat:?}");
}

#[tokio::test]
async fn unsupported_data_type_is_reported_as_such() {
    let a = std::sync::Arc::new(MockProvider::new("a").with_data_types(DataTypes::QUOTE));
    let svc = service(&[(&a, 1)]);

    let err = svc.get_earnings(AAPL).await.unwrap_err();
    assert!(matches!(err, MercatoError::Unsupported { .. }), "{err:?}");
    assert_eq!(a.total_calls(), 0);
}

#[tokio::test]
async fn providers_without_the_type_are_skipped() {
    let quotes_only = std::sync::Arc::new(MockProvider::new("quotes").with_data_types(DataTypes::QUOTE));
    let full = mock("full");
    let svc = service(&[(&quotes_only, 1), (&full, 2)]);

    let e = svc.get_earnings(AAPL).await.unwrap();
    assert_eq!(e.source, "full");
    let rec = &svc.get_recent_calls(1, None, false)[0];
    assert_eq!(rec.providers_tried, vec!["full"]);
    assert!(!rec.fallback_used);
}

#[tokio::test]
async fn blank_symbol_is_rejected_without_a_record() {
    let a = mock("a");
    let svc = service(&[(&a, 1)]);

    let err = svc.get_quote("   ").await.unwrap_err();
    assert!(matches!(err, MercatoError::InvalidArg(_)), "{err:?}");
    assert_eq!(a.total_calls(), 0);
    assert_eq!(svc.get_stats().totals.calls, 0);
}

#[tokio::test(start_paused = true)]
async fn hung_provider_times_out_and_next_one_serves() {
    init_tracing();
    let a = hanging("a", DataType::Quote);
    let b = mock("b");
    let svc = builder(&[(&a, ProviderConfig::new("a", 1)), (&b, ProviderConfig::new("b", 2))])
        .provider_timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let q = svc.get_quote(AAPL).await.unwrap();
    assert_eq!(q.source, "b");

    let rec = &svc.get_recent_calls(1, None, false)[0];
    assert_eq!(rec.attempts[0].failure, Some(FailureKind::Timeout));
    let a_health = svc.get_provider_health("a").unwrap();
    assert_eq!(a_health.state.consecutive_failures, 1);
    assert!(matches!(
        a_health.state.last_error,
        Some(MercatoError::ProviderTimeout { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn every_provider_timing_out_is_reported_once() {
    let a = hanging("a", DataType::Quote);
    let b = hanging("b", DataType::Quote);
    let svc = builder(&[(&a, ProviderConfig::new("a", 1)), (&b, ProviderConfig::new("b", 2))])
        .provider_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let err = svc.get_quote(AAPL).await.unwrap_err();
    assert!(matches!(err, MercatoError::AllProvidersTimedOut { .. }), "{err:?}");
}

#[tokio::test]
async fn batch_quotes_split_successes_and_failures() {
    let a = mock("a");
    let svc = service(&[(&a, 1)]);

    let (ok, failed) = svc.get_quotes(&[AAPL, MISSING, MSFT, TSLA]).await;
    let mut got: Vec<&str> = ok.iter().map(|q| q.symbol.as_str()).collect();
    got.sort_unstable();
    assert_eq!(got, vec![AAPL, MSFT, TSLA]);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, MISSING);
    assert!(matches!(failed[0].1, MercatoError::NotFound { .. }));
}
