//! Cached content reads and invalidating writes.

use super::{is_valid_slug, slugify, Category, Comment, ContentRepository, Post, Tag};
use crate::cache::Cache;
use crate::cached::{CacheOptions, CachedFn};
use crate::error::{Error, Result};
use crate::tag::CacheTag;
use crate::trigger::Mutation;
use std::sync::Arc;

const HOMEPAGE_REVALIDATE_SECS: u64 = 60;
const POST_REVALIDATE_SECS: u64 = 300;
const TAXONOMY_REVALIDATE_SECS: u64 = 3600;
const COMMENTS_REVALIDATE_SECS: u64 = 60;

/// Content service used by the public pages and the admin panel.
///
/// Public reads go through cached computations; admin writes go to the
/// repository and, only once they succeed, invalidate the affected tags.
///
/// # Example
///
/// ```ignore
/// let service = ContentService::new(cache.clone(), Arc::new(PgContentRepository::new(pool)));
///
/// let posts = service.homepage_posts(10).await?;   // database on first call
/// let posts = service.homepage_posts(10).await?;   // cache afterwards
///
/// service.update_post(edited).await?;            // drops posts + homepage entries
/// ```
pub struct ContentService<R: ContentRepository> {
    cache: Cache,
    repo: Arc<R>,
    homepage_posts: CachedFn<usize, Vec<Post>>,
    post_by_slug: CachedFn<String, Option<Post>>,
    categories: CachedFn<(), Vec<Category>>,
    tags: CachedFn<(), Vec<Tag>>,
    approved_comments: CachedFn<String, Vec<Comment>>,
}

impl<R: ContentRepository> ContentService<R> {
    pub fn new(cache: Cache, repo: Arc<R>) -> Self {
        let homepage_posts = {
            let repo = Arc::clone(&repo);
            cache.cached(
                &["homepage", "posts"],
                CacheOptions::new()
                    .with_revalidate_secs(HOMEPAGE_REVALIDATE_SECS)
                    .with_tags(&[CacheTag::Posts, CacheTag::Homepage]),
                move |limit: usize| {
                    let repo = Arc::clone(&repo);
                    async move { repo.published_posts(limit).await }
                },
            )
        };

        let post_by_slug = {
            let repo = Arc::clone(&repo);
            cache.cached(
                &["post", "by-slug"],
                CacheOptions::new()
                    .with_revalidate_secs(POST_REVALIDATE_SECS)
                    .with_tags(&[CacheTag::Posts]),
                move |slug: String| {
                    let repo = Arc::clone(&repo);
                    async move { repo.post_by_slug(&slug).await }
                },
            )
        };

        let categories = {
            let repo = Arc::clone(&repo);
            cache.cached(
                &["categories", "all"],
                CacheOptions::new()
                    .with_revalidate_secs(TAXONOMY_REVALIDATE_SECS)
                    .with_tags(&[CacheTag::Categories]),
                move |_: ()| {
                    let repo = Arc::clone(&repo);
                    async move { repo.categories().await }
                },
            )
        };

        let tags = {
            let repo = Arc::clone(&repo);
            cache.cached(
                &["tags", "all"],
                CacheOptions::new()
                    .with_revalidate_secs(TAXONOMY_REVALIDATE_SECS)
                    .with_tags(&[CacheTag::Tags]),
                move |_: ()| {
                    let repo = Arc::clone(&repo);
                    async move { repo.tags().await }
                },
            )
        };

        let approved_comments = {
            let repo = Arc::clone(&repo);
            cache.cached(
                &["comments", "approved"],
                CacheOptions::new()
                    .with_revalidate_secs(COMMENTS_REVALIDATE_SECS)
                    .with_tags(&[CacheTag::Comments]),
                move |post_id: String| {
                    let repo = Arc::clone(&repo);
                    async move { repo.approved_comments(&post_id).await }
                },
            )
        };

        ContentService {
            cache,
            repo,
            homepage_posts,
            post_by_slug,
            categories,
            tags,
            approved_comments,
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    // ========================================================================
    // Cached reads
    // ========================================================================

    pub async fn homepage_posts(&self, limit: usize) -> Result<Vec<Post>> {
        self.homepage_posts.call(limit).await
    }

    pub async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        self.post_by_slug.call(slug.to_string()).await
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.categories.call(()).await
    }

    pub async fn tags(&self) -> Result<Vec<Tag>> {
        self.tags.call(()).await
    }

    pub async fn approved_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        self.approved_comments.call(post_id.to_string()).await
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// # Errors
    ///
    /// `Error::ValidationError` for an empty title or malformed slug, or any
    /// repository error. Nothing is invalidated when the write fails.
    pub async fn create_post(&self, post: Post) -> Result<Post> {
        let saved = self.repo.save_post(prepare_post(post)?).await?;
        self.cache.apply(&Mutation::PostCreated {
            id: saved.id.clone(),
            slug: saved.slug.clone(),
        });
        Ok(saved)
    }

    /// # Errors
    ///
    /// Same as [`create_post`](Self::create_post).
    pub async fn update_post(&self, post: Post) -> Result<Post> {
        let saved = self.repo.save_post(prepare_post(post)?).await?;
        self.cache.apply(&Mutation::PostUpdated {
            id: saved.id.clone(),
            slug: saved.slug.clone(),
        });
        Ok(saved)
    }

    /// Returns false if no post had that id; the cache is left alone then.
    pub async fn delete_post(&self, id: &str) -> Result<bool> {
        match self.repo.delete_post(id).await? {
            Some(post) => {
                self.cache.apply(&Mutation::PostDeleted {
                    id: post.id,
                    slug: post.slug,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn save_category(&self, mut category: Category) -> Result<Category> {
        category.slug = prepare_slug(&category.name, &category.slug)?;
        let is_new = !self
            .repo
            .categories()
            .await?
            .iter()
            .any(|c| c.id == category.id);

        let saved = self.repo.save_category(category).await?;
        let id = saved.id.clone();
        self.cache.apply(&if is_new {
            Mutation::CategoryCreated { id }
        } else {
            Mutation::CategoryUpdated { id }
        });
        Ok(saved)
    }

    pub async fn delete_category(&self, id: &str) -> Result<bool> {
        let removed = self.repo.delete_category(id).await?;
        if removed {
            self.cache.apply(&Mutation::CategoryDeleted { id: id.to_string() });
        }
        Ok(removed)
    }

    pub async fn save_tag(&self, mut tag: Tag) -> Result<Tag> {
        tag.slug = prepare_slug(&tag.name, &tag.slug)?;
        let is_new = !self.repo.tags().await?.iter().any(|t| t.id == tag.id);

        let saved = self.repo.save_tag(tag).await?;
        let id = saved.id.clone();
        self.cache.apply(&if is_new {
            Mutation::TagCreated { id }
        } else {
            Mutation::TagUpdated { id }
        });
        Ok(saved)
    }

    pub async fn delete_tag(&self, id: &str) -> Result<bool> {
        let removed = self.repo.delete_tag(id).await?;
        if removed {
            self.cache.apply(&Mutation::TagDeleted { id: id.to_string() });
        }
        Ok(removed)
    }

    /// Store a visitor comment. New comments await moderation.
    pub async fn add_comment(&self, mut comment: Comment) -> Result<Comment> {
        if comment.author.trim().is_empty() || comment.body.trim().is_empty() {
            return Err(Error::ValidationError(
                "comment author and body are required".to_string(),
            ));
        }
        comment.approved = false;

        let saved = self.repo.save_comment(comment).await?;
        self.cache.apply(&Mutation::CommentCreated {
            post_id: saved.post_id.clone(),
        });
        Ok(saved)
    }

    /// Returns false if the comment does not exist.
    pub async fn approve_comment(&self, id: &str) -> Result<bool> {
        let Some(mut comment) = self.repo.comment(id).await? else {
            return Ok(false);
        };
        comment.approved = true;

        let saved = self.repo.save_comment(comment).await?;
        self.cache.apply(&Mutation::CommentApproved {
            post_id: saved.post_id,
        });
        Ok(true)
    }

    pub async fn delete_comment(&self, id: &str) -> Result<bool> {
        match self.repo.delete_comment(id).await? {
            Some(comment) => {
                self.cache.apply(&Mutation::CommentDeleted {
                    post_id: comment.post_id,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn prepare_post(mut post: Post) -> Result<Post> {
    if post.id.trim().is_empty() {
        return Err(Error::ValidationError("post id is required".to_string()));
    }
    post.slug = prepare_slug(&post.title, &post.slug)?;
    Ok(post)
}

/// Derive the slug from `name` when empty, then validate it.
fn prepare_slug(name: &str, slug: &str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(Error::ValidationError("title is required".to_string()));
    }
    let slug = if slug.is_empty() {
        slugify(name)
    } else {
        slug.to_string()
    };
    if !is_valid_slug(&slug) {
        return Err(Error::ValidationError(format!("invalid slug '{}'", slug)));
    }
    Ok(slug)
}
