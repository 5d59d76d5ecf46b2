//! In-flight request coalescing.
//!
//! The first caller for a key becomes the leader and performs the fetch.
//! Callers arriving while it runs become followers and wait on a per-key
//! `watch` channel; the map lock is only held for bookkeeping.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;

/// Why a follower stopped waiting without a value.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The leader was dropped before publishing.
    #[error("leader abandoned the request")]
    Abandoned,
    /// The follower's own wait bound elapsed.
    #[error("timed out waiting for leader")]
    TimedOut,
}

struct InFlight<V> {
    generation: u64,
    rx: watch::Receiver<Option<V>>,
}

/// Registry of in-flight keys.
pub struct RequestDeduplicator<K, V> {
    inflight: Mutex<HashMap<K, InFlight<V>>>,
    generation: AtomicU64,
}

impl<K, V> Default for RequestDeduplicator<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of [`RequestDeduplicator::join`].
pub enum Role<'a, K: Hash + Eq, V> {
    /// This caller must perform the fetch and publish the result.
    Leader(LeaderGuard<'a, K, V>),
    /// Another caller is already fetching.
    Follower(Follower<V>),
}

impl<K, V> RequestDeduplicator<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Register interest in `key`, becoming its leader if nobody else is.
    pub fn join(&self, key: K) -> Role<'_, K, V> {
        let mut map = self.inflight.lock();
        if let Some(existing) = map.get(&key) {
            return Role::Follower(Follower {
                rx: existing.rx.clone(),
            });
        }
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        map.insert(key.clone(), InFlight { generation, rx });
        drop(map);
        Role::Leader(LeaderGuard {
            dedup: self,
            key,
            generation,
            tx,
        })
    }

    /// Number of keys currently being fetched.
    pub fn in_flight(&self) -> usize {
        self.inflight.lock().len()
    }
}

/// Held by the leader for the duration of its fetch.
///
/// Dropping the guard without calling [`publish`](Self::publish) unregisters
/// the key and wakes every follower with [`WaitError::Abandoned`].
pub struct LeaderGuard<'a, K: Hash + Eq, V> {
    dedup: &'a RequestDeduplicator<K, V>,
    key: K,
    generation: u64,
    tx: watch::Sender<Option<V>>,
}

impl<K: Hash + Eq, V> LeaderGuard<'_, K, V> {
    /// The key this guard leads.
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Hand `value` to every follower and unregister the key.
    pub fn publish(self, value: V) {
        self.tx.send_replace(Some(value));
    }
}

impl<K: Hash + Eq, V> Drop for LeaderGuard<'_, K, V> {
    fn drop(&mut self) {
        let mut map = self.dedup.inflight.lock();
        if map
            .get(&self.key)
            .is_some_and(|e| e.generation == self.generation)
        {
            map.remove(&self.key);
        }
    }
}

/// Waiting side of a coalesced request.
pub struct Follower<V> {
    rx: watch::Receiver<Option<V>>,
}

impl<V: Clone> Follower<V> {
    /// Wait for the leader's value, bounded by `timeout` when given.
    ///
    /// Giving up does not affect the leader's fetch.
    ///
    /// # Errors
    /// Returns `TimedOut` when the bound elapses and `Abandoned` when the
    /// leader went away without publishing.
    pub async fn wait(mut self, timeout: Option<Duration>) -> Result<V, WaitError> {
        let rx = &mut self.rx;
        let recv = async move {
            match rx.wait_for(Option::is_some).await {
                Ok(v) => v.as_ref().cloned().ok_or(WaitError::Abandoned),
                Err(_) => Err(WaitError::Abandoned),
            }
        };
        match timeout {
            Some(limit) => tokio::time::timeout(limit, recv)
                .await
                .unwrap_or(Err(WaitError::TimedOut)),
            None => recv.await,
        }
    }
}
