use std::sync::Arc;
use std::time::Duration;

use mercato::{
    CallOutcome, DataType, FailureKind, JsonLineSink, MemorySink, MercatoError, ProviderConfig,
};
use mercato_mock::MockProvider;

use crate::helpers::{AAPL, MSFT, XYZ, builder, expiry, failing, mock, service};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 2.0
}

#[tokio::test]
async fn total_failure_is_visible_in_recent_errors() {
    let a = failing("a");
    let b = failing("b");
    let c = failing("c");
    let svc = service(&[(&a, 1), (&b, 2), (&c, 3)]);

    svc.get_quote(XYZ).await.unwrap_err();
    let err = svc.get_options_chain(XYZ, expiry()).await.unwrap_err();
    assert!(matches!(err, MercatoError::AllProvidersFailed { .. }), "{err:?}");

    let errors = svc.get_recent_calls(10, Some(DataType::OptionsChain), true);
    assert_eq!(errors.len(), 1);
    let rec = &errors[0];
    assert_eq!(rec.outcome, CallOutcome::Failure);
    assert_eq!(rec.providers_tried, vec!["a", "b", "c"]);
    assert_eq!(rec.key, "options_chain:XYZ:2024-03-15");
    assert!(rec.provider_used.is_none());
    assert!(rec.error.is_some());

    assert_eq!(svc.get_recent_calls(10, None, true).len(), 2);
    assert_eq!(svc.get_stats().recent_errors.len(), 2);
}

#[tokio::test]
async fn recent_calls_are_newest_first_and_limited() {
    let a = mock("a");
    let svc = service(&[(&a, 1)]);

    svc.get_quote(AAPL).await.unwrap();
    svc.get_info(AAPL).await.unwrap();
    svc.get_quote(MSFT).await.unwrap();

    let recent = svc.get_recent_calls(2, None, false);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].symbol, MSFT);
    assert_eq!(recent[1].data_type, DataType::Info);
    assert!(svc.get_recent_calls(10, None, true).is_empty());
}

#[tokio::test]
async fn stats_break_down_by_provider_and_data_type() {
    let a = failing("a");
    let b = mock("b");
    let svc = service(&[(&a, 1), (&b, 2)]);

    svc.get_quote(AAPL).await.unwrap();
    svc.get_quote(AAPL).await.unwrap();
    svc.get_info(MSFT).await.unwrap();

    let stats = svc.get_stats();
    assert_eq!(stats.totals.calls, 3);
    assert_eq!(stats.totals.successes, 3);
    assert_eq!(stats.totals.cache_hits, 1);
    assert_eq!(stats.totals.fallbacks, 2);

    let pa = &stats.providers["a"];
    assert_eq!(pa.attempts, 2);
    assert_eq!(pa.failures, 2);
    assert_eq!(pa.success_rate, Some(0.0));
    assert!(pa.last_error.is_some());
    let pb = &stats.providers["b"];
    assert_eq!(pb.successes, 2);

    let quotes = &stats.data_types[&DataType::Quote];
    assert_eq!(quotes.calls, 2);
    assert_eq!(quotes.cache_hits, 1);
    assert_eq!(stats.health.len(), 2);
    assert_eq!(stats.cache.entries, 2);
}

#[tokio::test(start_paused = true)]
async fn latency_percentiles_can_be_scoped_to_one_provider() {
    let slow = Arc::new(MockProvider::new("slow").with_delay(Duration::from_millis(100)));
    slow.set_failing(true);
    let fast = Arc::new(MockProvider::new("fast").with_delay(Duration::from_millis(20)));
    let svc = builder(&[
        (&slow, ProviderConfig::new("slow", 1)),
        (&fast, ProviderConfig::new("fast", 2)),
    ])
    .build()
    .unwrap();

    svc.get_quote(AAPL).await.unwrap();
    svc.get_quote(MSFT).await.unwrap();

    let all = svc.get_latency_percentiles(None);
    assert_eq!(all.samples, 2);
    assert!(close(all.p50, 120.0), "{all:?}");

    let s = svc.get_latency_percentiles(Some("slow"));
    assert_eq!(s.samples, 2);
    assert!(close(s.p99, 100.0), "{s:?}");

    let f = svc.get_latency_percentiles(Some("fast"));
    assert!(close(f.p50, 20.0), "{f:?}");

    let none = svc.get_latency_percentiles(Some("nobody"));
    assert_eq!(none.samples, 0);
    assert!(none.p50.abs() < f64::EPSILON);

    let stats = svc.get_stats();
    let slow_stats = &stats.providers["slow"];
    assert!(close(slow_stats.latency.avg_ms, 100.0));

    let last = &svc.get_recent_calls(1, None, true)[0];
    assert!(last.latency() >= Duration::from_millis(119), "{last:?}");
    assert!(last.latency() < Duration::from_millis(130), "{last:?}");
}

#[tokio::test(start_paused = true)]
async fn timeouts_are_counted_per_provider() {
    let hung = Arc::new(
        MockProvider::new("hung").with_behavior(DataType::Quote, mercato_mock::MockBehavior::Hang),
    );
    let b = mock("b");
    let svc = builder(&[(&hung, ProviderConfig::new("hung", 1)), (&b, ProviderConfig::new("b", 2))])
        .provider_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    svc.get_quote(AAPL).await.unwrap();
    let rec = &svc.get_recent_calls(1, None, false)[0];
    assert_eq!(rec.attempts[0].failure, Some(FailureKind::Timeout));
    assert_eq!(svc.get_stats().providers["hung"].timeouts, 1);
}

#[tokio::test]
async fn sinks_observe_every_call() {
    let a = mock("a");
    let memory = Arc::new(MemorySink::new(16));
    let json = Arc::new(JsonLineSink::new(Vec::<u8>::new()));
    let svc = builder(&[(&a, ProviderConfig::new("a", 1))])
        .with_call_sink(memory.clone())
        .with_call_sink(json.clone())
        .build()
        .unwrap();

    svc.get_quote(AAPL).await.unwrap();
    svc.get_quote(AAPL).await.unwrap();
    svc.get_quote("NOPE").await.unwrap_err();

    let records = memory.records();
    assert_eq!(records.len(), 3);
    assert!(!records[0].cache_hit);
    assert!(records[1].cache_hit);
    assert!(records[2].is_error());

    drop(svc);
    let json = Arc::into_inner(json).expect("service dropped its sink handle");
    let out = String::from_utf8(json.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = out
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["data_type"], "quote");
    assert_eq!(lines[1]["cache_hit"], true);
}

#[tokio::test]
async fn metrics_snapshot_serializes_and_resets() {
    let a = mock("a");
    let svc = service(&[(&a, 1)]);

    svc.get_quote(AAPL).await.unwrap();
    svc.get_quote(AAPL).await.unwrap();

    let v = serde_json::to_value(svc.get_metrics()).unwrap();
    assert_eq!(v["totals"]["calls"], 2);
    assert_eq!(v["cache"]["hits"], 1);
    assert!(v["latency"].is_object());
    assert_eq!(v["recent_calls"].as_array().map(Vec::len), Some(2));

    svc.reset_metrics();
    let stats = svc.get_stats();
    assert_eq!(stats.totals.calls, 0);
    assert_eq!(stats.cache.hits, 0);
    assert_eq!(stats.cache.entries, 1, "reset keeps cached values");
    assert!(svc.get_recent_calls(10, None, false).is_empty());
}
