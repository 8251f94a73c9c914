//! # blog-cache
//!
//! Read cache for a blog CMS: memoized data access with TTLs, tag based
//! invalidation and write-side triggers.
//!
//! ## Features
//!
//! - **Memory store:** TTL entries with a capacity bound, oldest insertion evicted first
//! - **Cached computations:** results keyed by name parts plus the call arguments
//! - **Tags:** a closed set (`posts`, `tags`, `categories`, `comments`, `analytics`, `homepage`)
//! - **Triggers:** content writes map to the tags they make stale
//! - **Content service:** cached public reads and invalidating admin writes
//!
//! ## Quick Start
//!
//! ```ignore
//! use blog_cache::{Cache, CacheConfig, CacheOptions, CacheTag, Mutation};
//!
//! let cache = Cache::new(CacheConfig::default());
//!
//! // 1. Wrap a database read
//! let homepage = cache.cached(
//!     &["homepage", "posts"],
//!     CacheOptions::new()
//!         .with_revalidate_secs(60)
//!         .with_tags(&[CacheTag::Posts, CacheTag::Homepage]),
//!     move |limit: usize| {
//!         let db = db.clone();
//!         async move { db.published_posts(limit).await }
//!     },
//! );
//!
//! // 2. Read through the cache
//! let posts = homepage.call(10).await?;
//!
//! // 3. After a successful write, invalidate what it touched
//! db.update_post(&post).await?;
//! cache.apply(&Mutation::PostUpdated { id: post.id.clone(), slug: post.slug.clone() });
//! ```
//!
//! [`content::ContentService`] packages exactly this for posts, taxonomy and
//! comments over any [`content::ContentRepository`].

#[macro_use]
extern crate log;

pub mod backend;
pub mod cache;
pub mod cached;
pub mod config;
pub mod content;
pub mod error;
pub mod key;
mod lock;
pub mod observability;
pub mod registry;
pub mod serialization;
pub mod tag;
pub mod trigger;

// Re-exports for convenience
pub use backend::{CacheStore, MemoryStore};
pub use cache::Cache;
pub use cached::{CacheOptions, CachedFn, Revalidate};
pub use config::CacheConfig;
pub use error::{Error, Result};
pub use observability::CacheMetrics;
pub use tag::CacheTag;
pub use trigger::Mutation;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
