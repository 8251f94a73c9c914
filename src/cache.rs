//! Shared cache handle.
//!
//! [`Cache`] bundles the store, the tag registry, the metrics hook and the
//! configuration behind `Arc`s. Build one at startup and hand clones to every
//! service that reads or invalidates cached data.

use crate::backend::{CacheStore, MemoryStore};
use crate::cached::{CacheOptions, CachedFn};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::registry::TagRegistry;
use crate::tag::CacheTag;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// Process-wide read cache with tag invalidation.
///
/// Cloning is cheap and every clone shares the same entries.
///
/// # Example
///
/// ```
/// use blog_cache::{Cache, CacheConfig, CacheOptions, CacheTag};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> blog_cache::Result<()> {
/// let cache = Cache::new(CacheConfig::default());
/// let site_title = cache.cached(
///     &["site", "title"],
///     CacheOptions::new().with_tags(&[CacheTag::Homepage]),
///     |_: ()| async { Ok::<_, blog_cache::Error>("Kişisel Blog".to_string()) },
/// );
///
/// assert_eq!(site_title.call(()).await?, "Kişisel Blog");
/// cache.invalidate_tag(CacheTag::Homepage);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    registry: Arc<TagRegistry>,
    metrics: Arc<dyn CacheMetrics>,
    config: Arc<CacheConfig>,
}

impl Cache {
    /// Create a cache backed by a [`MemoryStore`] sized from `config`.
    pub fn new(config: CacheConfig) -> Self {
        let store = Arc::new(MemoryStore::new(config.capacity));
        Self::with_store(config, store)
    }

    /// Create a cache over a custom store.
    pub fn with_store(config: CacheConfig, store: Arc<dyn CacheStore>) -> Self {
        debug!(
            "Cache initialised (enabled: {}, capacity: {}, default TTL: {}s)",
            config.enabled, config.capacity, config.default_revalidate_secs
        );
        Cache {
            store,
            registry: Arc::new(TagRegistry::new()),
            metrics: Arc::new(NoOpMetrics),
            config: Arc::new(config),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: impl CacheMetrics + 'static) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    /// Wrap a computation so its results are cached under `key_parts` and
    /// the options' tags. See [`CachedFn`].
    pub fn cached<A, R, F, Fut>(
        &self,
        key_parts: &[&str],
        options: CacheOptions,
        compute: F,
    ) -> CachedFn<A, R>
    where
        A: Serialize + Send + 'static,
        R: Serialize + DeserializeOwned + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        CachedFn::new(self.clone(), key_parts, options, compute)
    }

    /// Record `key` under `tags` ahead of storing it.
    ///
    /// Entries leave the store through eviction and expiry without telling the
    /// registry. Once a tag lists more than twice the configured capacity, its
    /// keys that are no longer stored are dropped, so the registry stays
    /// proportional to the store instead of to the distinct keys ever seen.
    pub fn register(&self, key: &str, tags: &[CacheTag]) {
        self.registry.register(key, tags);

        let limit = self.config.capacity.saturating_mul(2);
        for tag in tags {
            if self.registry.key_count(*tag) > limit {
                let pruned = self
                    .registry
                    .retain(*tag, |k| k == key || self.store.exists(k));
                debug!("Pruned {} dead keys from tag '{}'", pruned, tag);
            }
        }
    }

    /// Drop every entry produced under `tag`.
    ///
    /// Any read issued after this returns recomputes, including reads whose
    /// computation was already running. Returns the number of removed keys.
    pub fn invalidate_tag(&self, tag: CacheTag) -> usize {
        let keys = self.registry.invalidate(tag);
        for key in &keys {
            self.store.delete(key);
        }

        self.metrics.record_invalidation(tag, keys.len());
        info!("Invalidated cache tag '{}' ({} entries)", tag, keys.len());
        keys.len()
    }

    pub fn invalidate_tags(&self, tags: &[CacheTag]) -> usize {
        tags.iter().map(|tag| self.invalidate_tag(*tag)).sum()
    }

    /// Remove everything and outdate every in-flight computation.
    pub fn clear(&self) {
        self.registry.clear();
        self.store.clear();
        warn!("Cache cleared");
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn CacheStore {
        self.store.as_ref()
    }

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    pub(crate) fn metrics(&self) -> &dyn CacheMetrics {
        self.metrics.as_ref()
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidate_tag_removes_registered_keys() {
        let cache = Cache::default();
        cache.store().set("posts:null", vec![1], None);
        cache.store().set("categories:null", vec![2], None);
        cache.registry().register("posts:null", &[CacheTag::Posts]);
        cache
            .registry()
            .register("categories:null", &[CacheTag::Categories]);

        assert_eq!(cache.invalidate_tag(CacheTag::Posts), 1);
        assert!(!cache.store().exists("posts:null"));
        assert!(cache.store().exists("categories:null"));

        assert_eq!(cache.invalidate_tag(CacheTag::Posts), 0);
    }

    #[test]
    fn test_invalidate_tags_sums_removed() {
        let cache = Cache::default();
        for (key, tag) in [("a", CacheTag::Tags), ("b", CacheTag::Categories)] {
            cache.store().set(key, vec![0], None);
            cache.registry().register(key, &[tag]);
        }

        let removed = cache.invalidate_tags(&[CacheTag::Tags, CacheTag::Categories]);
        assert_eq!(removed, 2);
        assert!(cache.store().is_empty());
    }

    #[test]
    fn test_register_prunes_keys_gone_from_store() {
        let cache = Cache::new(CacheConfig::default().with_capacity(4));
        for i in 0..100 {
            let key = format!("post:by-slug:\"yazi-{}\"", i);
            cache.register(&key, &[CacheTag::Posts]);
            cache.store().set(&key, vec![0], None);
            assert!(cache.registry().key_count(CacheTag::Posts) <= 9);
        }

        assert_eq!(cache.store().len(), 4);
        assert!(cache
            .registry()
            .keys_for(CacheTag::Posts)
            .contains("post:by-slug:\"yazi-99\""));
        cache.invalidate_tag(CacheTag::Posts);
        assert!(cache.store().is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = Cache::default();
        let other = cache.clone();
        cache.store().set("k", vec![7], None);
        assert_eq!(other.store().get("k"), Some(vec![7]));

        other.clear();
        assert!(cache.store().is_empty());
    }
}
