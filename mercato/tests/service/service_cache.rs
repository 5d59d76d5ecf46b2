use std::time::Duration;

use mercato::{BarInterval, DataRequest, DataType, HistoryPeriod, HistoryQuery, ProviderConfig};
use rust_decimal::Decimal;

use crate::helpers::{AAPL, MSFT, builder, mock, service};

#[tokio::test(start_paused = true)]
async fn quote_is_served_from_cache_until_ttl_elapses() {
    let a = mock("a");
    let svc = builder(&[(&a, ProviderConfig::new("a", 10).with_ttl(DataType::Quote, 60))])
        .build()
        .unwrap();

    let q0 = svc.get_quote(AAPL).await.unwrap();
    assert_eq!(q0.price, Decimal::new(15_000, 2));
    assert_eq!(a.calls(DataType::Quote), 1);

    tokio::time::advance(Duration::from_secs(30)).await;
    let q30 = svc.get_quote(AAPL).await.unwrap();
    assert_eq!(q30, q0);
    assert_eq!(a.calls(DataType::Quote), 1, "t=30s must be a cache hit");

    tokio::time::advance(Duration::from_secs(31)).await;
    svc.get_quote(AAPL).await.unwrap();
    assert_eq!(a.calls(DataType::Quote), 2, "t=61s must refetch");

    let recent = svc.get_recent_calls(10, None, false);
    let hits: Vec<bool> = recent.iter().rev().map(|r| r.cache_hit).collect();
    assert_eq!(hits, vec![false, true, false]);
    assert_eq!(svc.get_cache_stats().expirations, 1);
}

#[tokio::test]
async fn repeated_requests_return_identical_envelopes() {
    let a = mock("a");
    let svc = service(&[(&a, 10)]);

    let first = svc.get_info(AAPL).await.unwrap();
    let second = svc.get_info(AAPL).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(a.calls(DataType::Info), 1);

    let stats = svc.get_stats();
    assert_eq!(stats.totals.calls, 2);
    assert_eq!(stats.totals.cache_hits, 1);
    assert_eq!(stats.totals.cache_misses, 1);
}

#[tokio::test]
async fn symbols_share_one_entry_regardless_of_case_and_padding() {
    let a = mock("a");
    let svc = service(&[(&a, 10)]);

    svc.get_quote(" aapl ").await.unwrap();
    let q = svc.get_quote(AAPL).await.unwrap();
    assert_eq!(q.symbol, AAPL);
    assert_eq!(a.calls(DataType::Quote), 1);
}

#[tokio::test]
async fn history_queries_are_cached_per_window() {
    let a = mock("a");
    let svc = service(&[(&a, 10)]);

    let daily = HistoryQuery::period(HistoryPeriod::M6, BarInterval::D1);
    let weekly = HistoryQuery::period(HistoryPeriod::M6, BarInterval::W1);
    svc.get_history(AAPL, daily).await.unwrap();
    svc.get_history(AAPL, daily).await.unwrap();
    svc.get_history(AAPL, weekly).await.unwrap();
    assert_eq!(a.calls(DataType::History), 2);
}

#[tokio::test]
async fn zero_ttl_disables_caching_for_that_type() {
    let a = mock("a");
    let svc = builder(&[(&a, ProviderConfig::new("a", 10).with_ttl(DataType::Quote, 0))])
        .build()
        .unwrap();

    svc.get_quote(AAPL).await.unwrap();
    svc.get_quote(AAPL).await.unwrap();
    assert_eq!(a.calls(DataType::Quote), 2);
    assert_eq!(svc.get_cache_stats().entries, 0);
}

#[tokio::test]
async fn invalidate_and_clear_force_refetch() {
    let a = mock("a");
    let svc = service(&[(&a, 10)]);

    svc.get_quote(AAPL).await.unwrap();
    svc.get_quote(MSFT).await.unwrap();
    assert_eq!(svc.get_cache_stats().entries, 2);

    let req = DataRequest::Quote {
        symbol: "aapl".to_string(),
    };
    assert!(svc.invalidate(&req).unwrap());
    assert!(!svc.invalidate(&req).unwrap());
    svc.get_quote(AAPL).await.unwrap();
    assert_eq!(a.calls(DataType::Quote), 3);

    svc.clear_cache();
    assert_eq!(svc.get_cache_stats().entries, 0);
    svc.get_quote(MSFT).await.unwrap();
    assert_eq!(a.calls(DataType::Quote), 4);
}

#[tokio::test(start_paused = true)]
async fn purge_expired_drops_only_stale_entries() {
    let a = mock("a");
    let svc = builder(&[(&a, ProviderConfig::new("a", 10).with_ttl(DataType::Quote, 5))])
        .build()
        .unwrap();

    svc.get_quote(AAPL).await.unwrap();
    svc.get_info(AAPL).await.unwrap();
    tokio::time::advance(Duration::from_secs(6)).await;

    assert_eq!(svc.purge_expired(), 1);
    assert_eq!(svc.get_cache_stats().entries, 1);
}
