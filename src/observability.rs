//! Metrics hooks for cache operations.
//!
//! Implement [`CacheMetrics`] to forward cache events to a monitoring system
//! and install it with [`Cache::with_metrics`](crate::Cache::with_metrics).
//! The trait's default methods log through the `log` crate; [`NoOpMetrics`]
//! (the default) records nothing.
//!
//! ```ignore
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         // counter!("blog_cache_hits").increment(1);
//!     }
//! }
//! ```

use crate::tag::CacheTag;
use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a cache miss; `duration` includes the recomputation.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record a cache write.
    fn record_set(&self, key: &str, bytes: usize) {
        debug!("Cache SET: {} ({} bytes)", key, bytes);
    }

    /// Record a tag invalidation and how many entries it removed.
    fn record_invalidation(&self, tag: CacheTag, removed: usize) {
        debug!("Cache INVALIDATE: {} removed {} entries", tag, removed);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_set(&self, _key: &str, _bytes: usize) {}
    fn record_invalidation(&self, _tag: CacheTag, _removed: usize) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics implementation that only uses the logging defaults.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}
