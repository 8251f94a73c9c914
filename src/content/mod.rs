//! Blog content records and the repository seam the cache sits in front of.
//!
//! The `ContentRepository` trait decouples the cached reads from the actual
//! database client. Implement it over SQLx, an ORM, or anything else that can
//! answer these queries; [`InMemoryContentRepository`] is provided for tests.

use crate::error::{Error, Result};
use crate::lock::mutex_lock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub mod service;

pub use service::ContentService;

const SOURCE: &str = "content";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub published: bool,
    pub category_id: Option<String>,
    pub tag_ids: Vec<String>,
    /// Unix seconds; homepage listings are newest first.
    pub created_at: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub body: String,
    pub approved: bool,
}

/// Turn a Turkish title into a URL slug.
///
/// ```
/// use blog_cache::content::slugify;
///
/// assert_eq!(slugify("Çağdaş Şiir Üzerine Güzel Notlar"), "cagdas-siir-uzerine-guzel-notlar");
/// assert_eq!(slugify("  İstanbul'da  Bir Gün!  "), "istanbulda-bir-gun");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars() {
        let mapped = match ch {
            'ç' | 'Ç' => 'c',
            'ğ' | 'Ğ' => 'g',
            'ı' | 'I' | 'İ' => 'i',
            'ö' | 'Ö' => 'o',
            'ş' | 'Ş' => 's',
            'ü' | 'Ü' => 'u',
            c if c.is_ascii_alphanumeric() => c.to_ascii_lowercase(),
            c if c.is_whitespace() || c == '-' || c == '_' => {
                pending_dash = !slug.is_empty();
                continue;
            }
            _ => continue,
        };

        if pending_dash {
            slug.push('-');
            pending_dash = false;
        }
        slug.push(mapped);
    }
    slug
}

/// True if `slug` only holds lowercase ASCII letters, digits and single dashes.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Trait for the content data source.
///
/// Reads are what the cache wraps; writes are what trigger invalidation.
/// Futures must be `Send` so cached reads can run on a multi-threaded runtime.
///
/// # Errors
///
/// Every method returns `Error::RepositoryError` when the data source fails.
pub trait ContentRepository: Send + Sync + 'static {
    /// Published posts, newest first, at most `limit`.
    fn published_posts(&self, limit: usize) -> impl Future<Output = Result<Vec<Post>>> + Send;

    fn post_by_slug(&self, slug: &str) -> impl Future<Output = Result<Option<Post>>> + Send;

    fn categories(&self) -> impl Future<Output = Result<Vec<Category>>> + Send;

    fn tags(&self) -> impl Future<Output = Result<Vec<Tag>>> + Send;

    fn approved_comments(&self, post_id: &str)
        -> impl Future<Output = Result<Vec<Comment>>> + Send;

    fn comment(&self, id: &str) -> impl Future<Output = Result<Option<Comment>>> + Send;

    /// Insert or replace a post.
    fn save_post(&self, post: Post) -> impl Future<Output = Result<Post>> + Send;

    /// Delete a post, returning it if it existed.
    fn delete_post(&self, id: &str) -> impl Future<Output = Result<Option<Post>>> + Send;

    fn save_category(&self, category: Category) -> impl Future<Output = Result<Category>> + Send;

    fn delete_category(&self, id: &str) -> impl Future<Output = Result<bool>> + Send;

    fn save_tag(&self, tag: Tag) -> impl Future<Output = Result<Tag>> + Send;

    fn delete_tag(&self, id: &str) -> impl Future<Output = Result<bool>> + Send;

    fn save_comment(&self, comment: Comment) -> impl Future<Output = Result<Comment>> + Send;

    fn delete_comment(&self, id: &str) -> impl Future<Output = Result<Option<Comment>>> + Send;
}

// ============================================================================
// In-Memory Test Repository
// ============================================================================

#[derive(Default)]
struct ContentTables {
    posts: BTreeMap<String, Post>,
    categories: BTreeMap<String, Category>,
    tags: BTreeMap<String, Tag>,
    comments: BTreeMap<String, Comment>,
}

/// In-memory content repository for tests and local runs.
///
/// Counts read queries so tests can tell cache hits from database reads, and
/// can be switched into a failing mode to simulate an unreachable database.
#[derive(Default)]
pub struct InMemoryContentRepository {
    tables: Mutex<ContentTables>,
    reads: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read queries served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn begin_read(&self) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::RepositoryError("database unreachable".to_string()));
        }
        Ok(())
    }

    fn begin_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::RepositoryError("database unreachable".to_string()));
        }
        Ok(())
    }
}

impl ContentRepository for InMemoryContentRepository {
    async fn published_posts(&self, limit: usize) -> Result<Vec<Post>> {
        self.begin_read()?;
        let tables = mutex_lock(&self.tables, SOURCE, "published_posts");
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| p.published)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit);
        Ok(posts)
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        self.begin_read()?;
        let tables = mutex_lock(&self.tables, SOURCE, "post_by_slug");
        Ok(tables.posts.values().find(|p| p.slug == slug).cloned())
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        self.begin_read()?;
        let tables = mutex_lock(&self.tables, SOURCE, "categories");
        Ok(tables.categories.values().cloned().collect())
    }

    async fn tags(&self) -> Result<Vec<Tag>> {
        self.begin_read()?;
        let tables = mutex_lock(&self.tables, SOURCE, "tags");
        Ok(tables.tags.values().cloned().collect())
    }

    async fn approved_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        self.begin_read()?;
        let tables = mutex_lock(&self.tables, SOURCE, "approved_comments");
        Ok(tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id && c.approved)
            .cloned()
            .collect())
    }

    async fn comment(&self, id: &str) -> Result<Option<Comment>> {
        self.begin_read()?;
        let tables = mutex_lock(&self.tables, SOURCE, "comment");
        Ok(tables.comments.get(id).cloned())
    }

    async fn save_post(&self, post: Post) -> Result<Post> {
        self.begin_write()?;
        let mut tables = mutex_lock(&self.tables, SOURCE, "save_post");
        if tables
            .posts
            .values()
            .any(|p| p.slug == post.slug && p.id != post.id)
        {
            return Err(Error::ValidationError(format!(
                "slug '{}' is already taken",
                post.slug
            )));
        }
        tables.posts.insert(post.id.clone(), post.clone());
        Ok(post)
    }

    async fn delete_post(&self, id: &str) -> Result<Option<Post>> {
        self.begin_write()?;
        let mut tables = mutex_lock(&self.tables, SOURCE, "delete_post");
        let removed = tables.posts.remove(id);
        if removed.is_some() {
            tables.comments.retain(|_, c| c.post_id != id);
        }
        Ok(removed)
    }

    async fn save_category(&self, category: Category) -> Result<Category> {
        self.begin_write()?;
        let mut tables = mutex_lock(&self.tables, SOURCE, "save_category");
        tables
            .categories
            .insert(category.id.clone(), category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: &str) -> Result<bool> {
        self.begin_write()?;
        let mut tables = mutex_lock(&self.tables, SOURCE, "delete_category");
        let removed = tables.categories.remove(id).is_some();
        if removed {
            for post in tables.posts.values_mut() {
                if post.category_id.as_deref() == Some(id) {
                    post.category_id = None;
                }
            }
        }
        Ok(removed)
    }

    async fn save_tag(&self, tag: Tag) -> Result<Tag> {
        self.begin_write()?;
        let mut tables = mutex_lock(&self.tables, SOURCE, "save_tag");
        tables.tags.insert(tag.id.clone(), tag.clone());
        Ok(tag)
    }

    async fn delete_tag(&self, id: &str) -> Result<bool> {
        self.begin_write()?;
        let mut tables = mutex_lock(&self.tables, SOURCE, "delete_tag");
        let removed = tables.tags.remove(id).is_some();
        if removed {
            for post in tables.posts.values_mut() {
                post.tag_ids.retain(|t| t != id);
            }
        }
        Ok(removed)
    }

    async fn save_comment(&self, comment: Comment) -> Result<Comment> {
        self.begin_write()?;
        let mut tables = mutex_lock(&self.tables, SOURCE, "save_comment");
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(Error::ValidationError(format!(
                "post '{}' does not exist",
                comment.post_id
            )));
        }
        tables.comments.insert(comment.id.clone(), comment.clone());
        Ok(comment)
    }

    async fn delete_comment(&self, id: &str) -> Result<Option<Comment>> {
        self.begin_write()?;
        let mut tables = mutex_lock(&self.tables, SOURCE, "delete_comment");
        Ok(tables.comments.remove(id))
    }
}
