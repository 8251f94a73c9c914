//! Tagged cache wrapper - memoizes a data-access computation.

use crate::cache::Cache;
use crate::error::Result;
use crate::key::CacheKeyBuilder;
use crate::serialization;
use crate::tag::CacheTag;
use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

type ComputeFn<A, R> = dyn Fn(A) -> BoxFuture<'static, Result<R>> + Send + Sync;

/// How long results of a cached computation stay fresh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Revalidate {
    /// Use `CacheConfig::default_revalidate_secs`.
    #[default]
    Default,

    /// Fixed duration for every result.
    After(Duration),

    /// Keep until evicted or invalidated by tag.
    Never,
}

/// Configuration of a cached computation.
///
/// # Example
///
/// ```
/// use blog_cache::{CacheOptions, CacheTag};
///
/// let options = CacheOptions::new()
///     .with_revalidate_secs(60)
///     .with_tags(&[CacheTag::Posts, CacheTag::Homepage]);
/// assert_eq!(options.tags.len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CacheOptions {
    pub revalidate: Revalidate,

    /// Invalidating any of these drops every result of the computation.
    pub tags: Vec<CacheTag>,

    /// Let concurrent misses on one key wait for a single computation.
    ///
    /// Off by default: two overlapping misses then both hit the database.
    pub coalesce_misses: bool,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_revalidate(mut self, ttl: Duration) -> Self {
        self.revalidate = Revalidate::After(ttl);
        self
    }

    pub fn with_revalidate_secs(self, secs: u64) -> Self {
        self.with_revalidate(Duration::from_secs(secs))
    }

    pub fn never_expire(mut self) -> Self {
        self.revalidate = Revalidate::Never;
        self
    }

    pub fn with_tags(mut self, tags: &[CacheTag]) -> Self {
        for tag in tags {
            if !self.tags.contains(tag) {
                self.tags.push(*tag);
            }
        }
        self
    }

    pub fn coalesce_misses(mut self, enabled: bool) -> Self {
        self.coalesce_misses = enabled;
        self
    }
}

/// A computation whose results are cached per argument value.
///
/// Calls with structurally equal arguments share one cache entry until it
/// expires or one of the computation's tags is invalidated. Failed
/// computations are returned to the caller and never cached.
///
/// Results are stored as postcard, which is not self-describing. Types that
/// need `deserialize_any` (`serde_json::Value`, untagged enums, flattened
/// maps) or that skip fields while serializing cannot be read back; such
/// results are returned but not cached, and each one is reported through
/// `CacheMetrics::record_error`. Use plain structs and enums for cached values.
///
/// # Example
///
/// ```
/// use blog_cache::{Cache, CacheOptions, CacheTag, CachedFn};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> blog_cache::Result<()> {
/// let cache = Cache::default();
/// let post_title: CachedFn<String, String> = CachedFn::new(
///     cache.clone(),
///     &["post", "title"],
///     CacheOptions::new().with_tags(&[CacheTag::Posts]),
///     |slug: String| async move { Ok::<_, blog_cache::Error>(slug.replace('-', " ")) },
/// );
///
/// assert_eq!(post_title.call("merhaba-dunya".to_string()).await?, "merhaba dunya");
/// # Ok(())
/// # }
/// ```
pub struct CachedFn<A, R> {
    cache: Cache,
    key_parts: Vec<String>,
    options: CacheOptions,
    compute: Arc<ComputeFn<A, R>>,
    in_flight: Arc<DashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<A, R> Clone for CachedFn<A, R> {
    fn clone(&self) -> Self {
        CachedFn {
            cache: self.cache.clone(),
            key_parts: self.key_parts.clone(),
            options: self.options.clone(),
            compute: Arc::clone(&self.compute),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<A, R> CachedFn<A, R>
where
    A: Serialize + Send + 'static,
    R: Serialize + DeserializeOwned + Send + 'static,
{
    /// Wrap `compute`.
    ///
    /// `key_parts` identify the computation itself and must differ between
    /// wrappers sharing a cache; arguments are appended per call.
    pub fn new<F, Fut>(cache: Cache, key_parts: &[&str], options: CacheOptions, compute: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        if key_parts.is_empty() {
            warn!("Cached computation created without key parts; every call will fail");
        }
        CachedFn {
            cache,
            key_parts: key_parts.iter().map(|p| p.to_string()).collect(),
            options,
            compute: Arc::new(move |args: A| compute(args).boxed()),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Cache key used for `args`.
    ///
    /// # Errors
    ///
    /// - `Error::ConfigError`: the computation has no key parts
    /// - `Error::SerializationError`: `args` cannot be rendered
    pub fn key_for(&self, args: &A) -> Result<String> {
        CacheKeyBuilder::build(&self.key_parts, args)
    }

    pub fn tags(&self) -> &[CacheTag] {
        &self.options.tags
    }

    /// Return the cached result for `args`, computing it on a miss.
    ///
    /// # Errors
    ///
    /// - Any error returned by the computation, unchanged
    /// - `Error::ConfigError` or `Error::SerializationError`: no key could be
    ///   built for `args`
    pub async fn call(&self, args: A) -> Result<R> {
        if !self.cache.config().enabled {
            return (self.compute)(args).await;
        }

        let timer = Instant::now();
        let key = self.key_for(&args)?;

        if let Some(value) = self.read(&key) {
            self.cache.metrics().record_hit(&key, timer.elapsed());
            return Ok(value);
        }

        if !self.options.coalesce_misses {
            return self.compute_and_store(&key, args, timer).await;
        }

        let gate = Arc::clone(self.in_flight.entry(key.clone()).or_default().value());
        let result = {
            let _guard = gate.lock().await;
            match self.read(&key) {
                Some(value) => {
                    self.cache.metrics().record_hit(&key, timer.elapsed());
                    Ok(value)
                }
                None => self.compute_and_store(&key, args, timer).await,
            }
        };

        // map + this task hold the only references: nobody else is waiting
        self.in_flight
            .remove_if(&key, |_, gate| Arc::strong_count(gate) <= 2);
        result
    }

    /// Invalidate every tag of this computation.
    pub fn invalidate(&self) -> usize {
        self.cache.invalidate_tags(&self.options.tags)
    }

    fn ttl(&self) -> Option<Duration> {
        match self.options.revalidate {
            Revalidate::Default => Some(self.cache.config().default_revalidate()),
            Revalidate::After(ttl) => Some(ttl),
            Revalidate::Never => None,
        }
    }

    fn read(&self, key: &str) -> Option<R> {
        let bytes = self.cache.store().get(key)?;
        match serialization::decode::<R>(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                self.cache.metrics().record_error(key, &e.to_string());
                if e.is_stale_entry() {
                    warn!("Dropping undecodable cache entry {}: {}", key, e);
                    self.cache.store().delete(key);
                }
                None
            }
        }
    }

    async fn compute_and_store(&self, key: &str, args: A, timer: Instant) -> Result<R> {
        let registry = self.cache.registry();
        let snapshot = registry.snapshot(&self.options.tags);

        let value = match (self.compute)(args).await {
            Ok(value) => value,
            Err(e) => {
                self.cache.metrics().record_error(key, &e.to_string());
                return Err(e);
            }
        };

        match serialization::encode_checked::<R>(&value) {
            Ok(bytes) => {
                let size = bytes.len();
                self.cache.register(key, &self.options.tags);
                self.cache.store().set(key, bytes, self.ttl());

                if registry.is_current(&snapshot) {
                    self.cache.metrics().record_set(key, size);
                } else {
                    // a tag was invalidated while computing; the result may predate the write
                    self.cache.store().delete(key);
                    debug!("Discarded {} computed across an invalidation", key);
                }
            }
            Err(e) => {
                warn!("Not caching {}: {}", key, e);
                self.cache.metrics().record_error(key, &e.to_string());
            }
        }

        self.cache.metrics().record_miss(key, timer.elapsed());
        Ok(value)
    }
}
