use std::sync::Arc;
use std::time::Duration;

use mercato::{CallOptions, DataType, MarketDataService, MercatoError, ProviderConfig};
use mercato_mock::MockProvider;

use crate::helpers::{AAPL, builder, service};

fn slow(name: &str, delay: Duration) -> Arc<MockProvider> {
    Arc::new(MockProvider::new(name).with_delay(delay))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fifty_concurrent_misses_share_one_fetch() {
    let a = slow("a", Duration::from_millis(200));
    let svc = service(&[(&a, 10)]);

    let barrier = Arc::new(tokio::sync::Barrier::new(50));
    let handles: Vec<_> = (0..50)
        .map(|_| {
            let svc = svc.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                svc.get_quote(AAPL).await
            })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    let quotes: Vec<_> = results
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();

    assert_eq!(a.calls(DataType::Quote), 1);
    assert!(quotes.iter().all(|q| *q == quotes[0]));

    let stats = svc.get_stats();
    assert_eq!(stats.totals.calls, 50);
    assert_eq!(stats.totals.successes, 50);
    assert_eq!(
        stats.totals.deduplicated + stats.totals.cache_hits,
        49,
        "only the leader reaches the providers"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn followers_receive_the_leaders_failure() {
    let a = Arc::new(MockProvider::new("a").with_delay(Duration::from_millis(200)));
    a.set_failing(true);
    let svc = service(&[(&a, 10)]);

    let barrier = Arc::new(tokio::sync::Barrier::new(10));
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let svc = svc.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                svc.get_quote(AAPL).await
            })
        })
        .collect();

    for r in futures::future::join_all(handles).await {
        let err = r.unwrap().unwrap_err();
        assert!(matches!(err, MercatoError::AllProvidersFailed { .. }), "{err:?}");
    }
    assert_eq!(a.calls(DataType::Quote), 1);
    assert_eq!(svc.get_stats().totals.deduplicated, 9);
}

#[tokio::test(start_paused = true)]
async fn follower_timeout_leaves_the_leader_running() {
    let a = slow("a", Duration::from_secs(10));
    let svc = service(&[(&a, 10)]);

    let leader = {
        let svc = svc.clone();
        tokio::spawn(async move { svc.get_quote(AAPL).await })
    };
    tokio::task::yield_now().await;

    let opts = CallOptions::new().with_dedup_wait(Duration::from_secs(1));
    let err = svc.get_quote_with(AAPL, &opts).await.unwrap_err();
    assert!(matches!(err, MercatoError::DedupWaitTimeout { .. }), "{err:?}");

    let q = leader.await.unwrap().unwrap();
    assert_eq!(q.source, "a");
    assert_eq!(a.calls(DataType::Quote), 1);

    // The leader still populated the cache for everyone.
    svc.get_quote(AAPL).await.unwrap();
    assert_eq!(a.calls(DataType::Quote), 1);

    let recent = svc.get_recent_calls(10, None, true);
    assert_eq!(recent.len(), 1);
    assert!(recent[0].deduplicated);
}

#[tokio::test(start_paused = true)]
async fn dropped_leader_releases_followers() {
    let a = slow("a", Duration::from_secs(10));
    let svc = service(&[(&a, 10)]);

    let leader = {
        let svc = svc.clone();
        tokio::spawn(async move { svc.get_quote(AAPL).await })
    };
    tokio::task::yield_now().await;

    let follower = {
        let svc = svc.clone();
        tokio::spawn(async move { svc.get_quote(AAPL).await })
    };
    tokio::task::yield_now().await;

    leader.abort();
    let err = follower.await.unwrap().unwrap_err();
    assert!(matches!(err, MercatoError::DedupLeaderAbandoned { .. }), "{err:?}");

    // The key is free again: the next caller leads a fresh fetch.
    svc.get_quote(AAPL).await.unwrap();
    assert_eq!(a.calls(DataType::Quote), 2);
}

#[tokio::test(start_paused = true)]
async fn caller_deadline_bounds_the_follower_wait() {
    let a = slow("a", Duration::from_secs(10));
    let svc = builder(&[(&a, ProviderConfig::new("a", 10))])
        .dedup_wait_timeout(None)
        .build()
        .unwrap();

    let leader = {
        let svc: MarketDataService = svc.clone();
        tokio::spawn(async move { svc.get_quote(AAPL).await })
    };
    tokio::task::yield_now().await;

    let opts = CallOptions::new().with_deadline(Duration::from_secs(2));
    let err = svc.get_quote_with(AAPL, &opts).await.unwrap_err();
    assert!(matches!(err, MercatoError::DedupWaitTimeout { .. }), "{err:?}");
    assert!(leader.await.unwrap().is_ok());
}
