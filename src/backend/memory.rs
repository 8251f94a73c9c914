//! In-memory cache store (default, thread-safe).
//!
//! Entries live in an `LruCache` that is only ever read with `peek`, so its
//! recency order is pure insertion order. Expired entries are removed lazily
//! on read and eagerly when the store is full.

use super::CacheStore;
use crate::lock::mutex_lock;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

const SOURCE: &str = "backend::memory";

/// In-memory cache entry with optional expiration.
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Option<Duration>, now: Instant) -> Self {
        let expires_at = ttl.and_then(|d| now.checked_add(d));
        CacheEntry { data, expires_at }
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// Bounded, TTL-aware in-memory store.
///
/// When a new key arrives and the store is full, expired entries are purged
/// first; if none had expired, the oldest-inserted entry is evicted.
/// Overwriting an existing key never evicts and moves that key to the newest
/// position.
///
/// # Example
///
/// ```
/// use blog_cache::backend::{CacheStore, MemoryStore};
/// use std::time::Duration;
///
/// let store = MemoryStore::new(2);
/// store.set("a", b"1".to_vec(), None);
/// store.set("b", b"2".to_vec(), Some(Duration::from_secs(60)));
/// store.set("c", b"3".to_vec(), None);
///
/// assert_eq!(store.len(), 2);
/// assert!(store.get("a").is_none());
/// ```
pub struct MemoryStore {
    entries: Mutex<LruCache<String, CacheEntry>>,
    evictions: AtomicU64,
}

impl MemoryStore {
    /// Create a store holding at most `capacity` entries (clamped to 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        MemoryStore {
            entries: Mutex::new(LruCache::new(capacity)),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "capacity").cap().get()
    }

    /// Get memory statistics.
    pub fn stats(&self) -> StoreStats {
        let now = Instant::now();
        let entries = mutex_lock(&self.entries, SOURCE, "stats");

        StoreStats {
            total_entries: entries.len(),
            expired_entries: entries.iter().filter(|(_, e)| e.is_expired_at(now)).count(),
            total_bytes: entries.iter().map(|(_, e)| e.data.len()).sum(),
            capacity: entries.cap().get(),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Print store statistics to debug log.
    pub fn log_stats(&self) {
        let stats = self.stats();
        debug!(
            "Cache Stats: {}/{} entries ({} expired), {} bytes, {} evictions",
            stats.total_entries,
            stats.capacity,
            stats.expired_entries,
            stats.total_bytes,
            stats.evictions
        );
    }
}

/// Remove every expired entry, returning how many were dropped.
fn purge_expired(entries: &mut LruCache<String, CacheEntry>, now: Instant) -> usize {
    let expired: Vec<String> = entries
        .iter()
        .filter(|(_, entry)| entry.is_expired_at(now))
        .map(|(key, _)| key.clone())
        .collect();

    for key in &expired {
        entries.pop(key.as_str());
    }
    expired.len()
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");

        if let Some(entry) = entries.peek(key) {
            if !entry.is_expired_at(now) {
                debug!("✓ Memory GET {} -> HIT", key);
                return Some(entry.data.clone());
            }
        } else {
            debug!("✓ Memory GET {} -> MISS", key);
            return None;
        }

        entries.pop(key);
        debug!("✓ Memory GET {} -> EXPIRED", key);
        None
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "set");

        if !entries.contains(key) && entries.len() >= entries.cap().get() {
            let purged = purge_expired(&mut entries, now);
            if purged > 0 {
                debug!("✓ Memory PURGE {} expired entries", purged);
            } else if let Some((evicted, _)) = entries.pop_lru() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("✓ Memory EVICT {} (capacity {})", evicted, entries.cap());
            }
        }

        entries.put(key.to_string(), CacheEntry::new(value, ttl, now));

        match ttl {
            Some(d) => debug!("✓ Memory SET {} (TTL: {:?})", key, d),
            None => debug!("✓ Memory SET {}", key),
        }
    }

    fn delete(&self, key: &str) {
        mutex_lock(&self.entries, SOURCE, "delete").pop(key);
        debug!("✓ Memory DELETE {}", key);
    }

    fn clear(&self) {
        mutex_lock(&self.entries, SOURCE, "clear").clear();
        info!("Memory store cleared");
    }

    fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    fn exists(&self, key: &str) -> bool {
        let now = Instant::now();
        mutex_lock(&self.entries, SOURCE, "exists")
            .peek(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }
}

/// Store statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_bytes: usize,
    pub capacity: usize,
    pub evictions: u64,
}
