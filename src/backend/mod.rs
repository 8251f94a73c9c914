//! Cache store implementations.

use std::time::Duration;

pub mod memory;

pub use memory::{MemoryStore, StoreStats};

/// Trait for cache store implementations.
///
/// The store is a plain key → bytes map with per-entry expiry. Operations are
/// in-memory state transitions and cannot fail.
///
/// All methods take `&self`; implementations use interior mutability so one
/// store can be shared by every request handler through an `Arc`.
pub trait CacheStore: Send + Sync {
    /// Retrieve a live value.
    ///
    /// Returns `None` if the key is absent or expired. An expired entry is
    /// removed before returning.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Insert or overwrite a value.
    ///
    /// `ttl = None` keeps the entry until it is evicted or deleted.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>);

    /// Remove a value. No-op if absent.
    fn delete(&self, key: &str);

    /// Remove every value.
    fn clear(&self);

    /// Number of stored entries, expired ones included until they are purged.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if a live value exists.
    fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}
