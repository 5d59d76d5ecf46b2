//! Sharded TTL + LRU response cache.

use std::hash::{BuildHasher, Hash, RandomState};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lru::LruCache;
use mercato_core::CacheStats;
use parking_lot::Mutex;
use tokio::time::Instant;

/// One immutable cached value with its expiry instant.
#[derive(Debug)]
pub struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    /// The cached value.
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// When the entry was written.
    pub const fn stored_at(&self) -> Instant {
        self.stored_at
    }

    /// Last instant at which the entry is still served.
    pub const fn expires_at(&self) -> Instant {
        self.expires_at
    }

    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

// Longest lifetime handed to the clock; larger TTLs are clamped.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 86_400);

type Shard<K, V> = Mutex<LruCache<K, Arc<CacheEntry<V>>>>;

/// Bounded cache with least-recently-used eviction and per-entry expiry.
///
/// The cache does not choose TTLs; callers pass the lifetime on every `put`.
/// Keys are spread over independently locked shards. LRU order is exact
/// within a shard, and the capacity is split across shards, so with more
/// than one shard eviction is LRU per shard rather than globally.
///
/// Entries are swapped in whole behind an `Arc`, so a `get` racing a `put`
/// for the same key observes either the old or the new value.
///
/// Expired entries are dropped lazily on lookup, or eagerly via
/// [`purge_expired`](Self::purge_expired).
pub struct ResponseCache<K, V> {
    shards: Box<[Shard<K, V>]>,
    hasher: RandomState,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl<K, V> ResponseCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Cache holding at most `capacity` entries spread over `shards` shards.
    ///
    /// Both values are clamped to at least one, and the shard count never
    /// exceeds the capacity.
    pub fn new(capacity: usize, shards: usize) -> Self {
        let capacity = capacity.max(1);
        let n = shards.clamp(1, capacity);
        let base = capacity / n;
        let extra = capacity % n;
        let shards = (0..n)
            .map(|i| {
                let cap = base + usize::from(i < extra);
                let cap = NonZeroUsize::new(cap).unwrap_or(NonZeroUsize::MIN);
                Mutex::new(LruCache::new(cap))
            })
            .collect();
        Self {
            shards,
            hasher: RandomState::new(),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    fn shard(&self, key: &K) -> &Shard<K, V> {
        let h = self.hasher.hash_one(key);
        let idx = usize::try_from(h % self.shards.len() as u64).unwrap_or_default();
        &self.shards[idx]
    }

    fn lookup(&self, key: &K) -> Option<Arc<CacheEntry<V>>> {
        let now = Instant::now();
        let mut shard = self.shard(key).lock();
        let expired = match shard.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(Arc::clone(entry)),
            Some(_) => true,
            None => false,
        };
        if expired {
            shard.pop(key);
            drop(shard);
            self.expirations.fetch_add(1, Ordering::Relaxed);
        }
        None
    }

    /// Return a clone of the live value for `key`, counting a hit or a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let found = self.get_entry(key);
        found.map(|e| e.value.clone())
    }

    /// Like [`get`](Self::get) but returns the shared entry.
    pub fn get_entry(&self, key: &K) -> Option<Arc<CacheEntry<V>>> {
        let found = self.lookup(key);
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Look up `key` again after a miss was already counted for it.
    ///
    /// Counts a hit when the value is now present and nothing otherwise.
    pub fn recheck(&self, key: &K) -> Option<V> {
        let found = self.lookup(key)?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(found.value.clone())
    }

    /// Store `value` for `ttl`. A zero TTL stores nothing.
    pub fn put(&self, key: K, value: V, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let stored_at = Instant::now();
        let expires_at = stored_at
            .checked_add(ttl.min(MAX_TTL))
            .unwrap_or(stored_at);
        let entry = Arc::new(CacheEntry {
            value,
            stored_at,
            expires_at,
        });
        let mut shard = self.shard(&key).lock();
        let displaced = shard.push(key.clone(), entry);
        drop(shard);
        if let Some((old_key, _)) = displaced
            && old_key != key
        {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove `key`. Returns whether an entry was present.
    pub fn invalidate(&self, key: &K) -> bool {
        self.shard(key).lock().pop(key).is_some()
    }

    /// Remove every entry. Counters are kept.
    pub fn clear(&self) {
        for shard in &*self.shards {
            shard.lock().clear();
        }
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        for shard in &*self.shards {
            let mut shard = shard.lock();
            let dead: Vec<K> = shard
                .iter()
                .filter(|(_, e)| e.is_expired(now))
                .map(|(k, _)| k.clone())
                .collect();
            for k in &dead {
                shard.pop(k);
            }
            removed += dead.len();
        }
        self.expirations.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Entries currently held, including expired ones not yet dropped.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured entry budget.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Zero the hit/miss/eviction/expiration counters.
    pub fn reset_counters(&self) {
        for c in [&self.hits, &self.misses, &self.evictions, &self.expirations] {
            c.store(0, Ordering::Relaxed);
        }
    }

    /// Read-only counter snapshot.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        CacheStats {
            entries: self.len(),
            capacity: self.capacity,
            hits,
            misses,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}
