//! In-memory TTL cache with read-through fetching
//!
//! Entries carry an absolute expiry instant taken from an injectable [`Clock`].
//! Expired entries read as absent and are dropped the next time they are
//! looked up, or when a capacity bound forces an eviction pass.

use chrono::Duration;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

use super::clock::{Clock, SystemClock};

/// Errors raised by the cache itself (fetch errors pass through untouched)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// TTL was zero or negative
    #[error("TTL must be positive, got {0}")]
    InvalidTtl(Duration),

    /// A bounded fetch did not finish in time
    #[error("fetch timed out after {0:?}")]
    FetchTimedOut(StdDuration),
}

/// Counters describing how lookups were served
///
/// `misses` counts every lookup that returned nothing; `expired` is the
/// subset of those misses that found a stale entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub evictions: u64,
}

/// A stored value and its expiry
#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    /// Logical timestamp of the last store or hit, for LRU eviction
    last_access: u64,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug)]
struct Inner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    tick: u64,
    stats: CacheStats,
}

impl<K: Eq + Hash + Clone, V> Inner<K, V> {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Makes room for one more entry: stale entries go first, then the
    /// least recently used live one if the map is still full.
    fn evict_for_insert(&mut self, now: Instant, max_entries: usize) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now));
        let mut evicted = before - self.entries.len();

        if self.entries.len() >= max_entries {
            let lru = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone());
            if let Some(key) = lru {
                self.entries.remove(&key);
                evicted += 1;
            }
        }

        self.stats.evictions += evicted as u64;
    }
}

type FlightMap<K> = Mutex<HashMap<K, Arc<AsyncMutex<()>>>>;

/// Membership in the per-key fetch queue
///
/// Dropping the last handle removes the key's slot, including when the
/// owning future is cancelled mid-fetch.
struct Flight<'a, K: Eq + Hash> {
    flights: &'a FlightMap<K>,
    key: K,
    lock: Arc<AsyncMutex<()>>,
}

impl<K: Eq + Hash> Drop for Flight<'_, K> {
    fn drop(&mut self) {
        let mut flights = self.flights.lock();
        // One reference in the map plus ours means nobody else is queued.
        let idle = flights
            .get(&self.key)
            .is_some_and(|slot| Arc::ptr_eq(slot, &self.lock) && Arc::strong_count(slot) <= 2);
        if idle {
            flights.remove(&self.key);
        }
    }
}

/// Thread-safe TTL cache keyed by an opaque request descriptor
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use wxlookup::cache::TtlCache;
///
/// let cache: TtlCache<String, u32> = TtlCache::new();
/// cache.store("vancouver".to_string(), 21, Duration::seconds(60)).unwrap();
/// assert_eq!(cache.lookup(&"vancouver".to_string()), Some(21));
/// ```
pub struct TtlCache<K, V, C = SystemClock> {
    inner: Mutex<Inner<K, V>>,
    flights: FlightMap<K>,
    max_entries: Option<usize>,
    clock: C,
}

impl<K, V> Default for TtlCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TtlCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an unbounded cache on the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    /// Creates an unbounded cache reading time from `clock`
    pub fn with_clock(clock: C) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                tick: 0,
                stats: CacheStats::default(),
            }),
            flights: Mutex::new(HashMap::new()),
            max_entries: None,
            clock,
        }
    }

    /// Bounds the cache to `max_entries` entries (at least one)
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    /// Returns the cached value if it exists and has not expired
    ///
    /// Never-seen and expired keys both read as `None`. An expired entry is
    /// removed on the way out.
    pub fn lookup(&self, key: &K) -> Option<V> {
        self.read(key, true)
    }

    /// Stores `value` under `key` for `ttl`, replacing any previous entry
    ///
    /// # Errors
    /// * `CacheError::InvalidTtl` if `ttl` is zero or negative; the cache is
    ///   left unchanged
    pub fn store(&self, key: K, value: V, ttl: Duration) -> Result<(), CacheError> {
        let ttl = validate_ttl(ttl)?;
        let now = self.clock.now();

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let tick = inner.next_tick();

        if let Some(max_entries) = self.max_entries {
            if !inner.entries.contains_key(&key) && inner.entries.len() >= max_entries {
                inner.evict_for_insert(now, max_entries);
            }
        }

        inner.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + ttl,
                last_access: tick,
            },
        );
        Ok(())
    }

    /// Returns the cached value, or runs `fetch` and caches its result
    ///
    /// Concurrent callers missing on the same key queue behind a single
    /// fetch and receive the value it stored. A failed fetch is returned as
    /// is and leaves the cache untouched; the next queued caller then tries
    /// its own fetch.
    ///
    /// # Errors
    /// * The fetch's own error, unchanged
    /// * `CacheError::InvalidTtl` (converted into `E`) before any fetch runs
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, ttl: Duration, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: From<CacheError>,
    {
        validate_ttl(ttl)?;

        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }

        let flight = self.join_flight(&key);
        let _turn = flight.lock.lock().await;

        // Whoever held the turn before us may have filled the entry. This
        // caller's miss is already counted.
        if let Some(value) = self.read(&key, false) {
            return Ok(value);
        }

        tracing::trace!("cache miss, running fetch");
        let value = fetch().await?;
        self.store(key, value.clone(), ttl)?;
        Ok(value)
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch), with the fetch bounded by
    /// `timeout`
    ///
    /// # Errors
    /// * `CacheError::FetchTimedOut` (converted into `E`) if the fetch does
    ///   not complete in time; nothing is stored
    pub async fn get_or_fetch_with_timeout<F, Fut, E>(
        &self,
        key: K,
        ttl: Duration,
        timeout: StdDuration,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: From<CacheError>,
    {
        self.get_or_fetch(key, ttl, move || async move {
            match tokio::time::timeout(timeout, fetch()).await {
                Ok(result) => result,
                Err(_) => Err(CacheError::FetchTimedOut(timeout).into()),
            }
        })
        .await
    }

    /// Removes the entry for `key`, returning its value if it was still fresh
    pub fn remove(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        self.inner
            .lock()
            .entries
            .remove(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value)
    }

    /// Drops every expired entry and returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| entry.is_fresh(now));
        before - inner.entries.len()
    }

    /// Number of physically stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    fn read(&self, key: &K, record: bool) -> Option<V> {
        let now = self.clock.now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let tick = inner.next_tick();

        let fresh = inner.entries.get(key).map(|entry| entry.is_fresh(now));
        if record {
            match fresh {
                Some(true) => inner.stats.hits += 1,
                Some(false) => {
                    inner.stats.misses += 1;
                    inner.stats.expired += 1;
                }
                None => inner.stats.misses += 1,
            }
        }

        match fresh {
            Some(true) => {
                let entry = inner.entries.get_mut(key)?;
                entry.last_access = tick;
                Some(entry.value.clone())
            }
            Some(false) => {
                inner.entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn join_flight(&self, key: &K) -> Flight<'_, K> {
        let lock = self
            .flights
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        Flight {
            flights: &self.flights,
            key: key.clone(),
            lock,
        }
    }
}

fn validate_ttl(ttl: Duration) -> Result<StdDuration, CacheError> {
    if ttl <= Duration::zero() {
        return Err(CacheError::InvalidTtl(ttl));
    }
    ttl.to_std().map_err(|_| CacheError::InvalidTtl(ttl))
}
