//! Invalidation triggers for content writes.
//!
//! Write paths describe what they changed with a [`Mutation`] and hand it to
//! [`Cache::apply`] once the database write has succeeded.
//!
//! ```ignore
//! // After a successful post update:
//! cache.apply(&Mutation::PostUpdated { id: post.id.clone(), slug: post.slug.clone() });
//! ```

use crate::cache::Cache;
use crate::tag::CacheTag;

const POST_TAGS: &[CacheTag] = &[CacheTag::Posts, CacheTag::Homepage];
// deleting a post also deletes its comments
const POST_DELETE_TAGS: &[CacheTag] = &[CacheTag::Posts, CacheTag::Homepage, CacheTag::Comments];
const CATEGORY_TAGS: &[CacheTag] = &[CacheTag::Categories];
// taxonomy deletes detach the entity from every post
const CATEGORY_DELETE_TAGS: &[CacheTag] =
    &[CacheTag::Categories, CacheTag::Posts, CacheTag::Homepage];
const TAG_TAGS: &[CacheTag] = &[CacheTag::Tags];
const TAG_DELETE_TAGS: &[CacheTag] = &[CacheTag::Tags, CacheTag::Posts, CacheTag::Homepage];
const COMMENT_TAGS: &[CacheTag] = &[CacheTag::Comments];
const ANALYTICS_TAGS: &[CacheTag] = &[CacheTag::Analytics];

/// A successful content write.
///
/// Invalidation is per tag, so the ids carried here do not narrow what gets
/// dropped; they identify the written record in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    // Posts (homepage listings derive from posts)
    PostCreated { id: String, slug: String },
    PostUpdated { id: String, slug: String },
    PostDeleted { id: String, slug: String },

    // Taxonomy
    CategoryCreated { id: String },
    CategoryUpdated { id: String },
    CategoryDeleted { id: String },
    TagCreated { id: String },
    TagUpdated { id: String },
    TagDeleted { id: String },

    // Moderation
    CommentCreated { post_id: String },
    CommentApproved { post_id: String },
    CommentDeleted { post_id: String },

    /// Page views or other counters were recorded.
    AnalyticsRecorded,
}

impl Mutation {
    /// Tags whose cached data this write makes stale.
    pub fn tags(&self) -> &'static [CacheTag] {
        match self {
            Mutation::PostCreated { .. } | Mutation::PostUpdated { .. } => POST_TAGS,
            Mutation::PostDeleted { .. } => POST_DELETE_TAGS,
            Mutation::CategoryCreated { .. } | Mutation::CategoryUpdated { .. } => CATEGORY_TAGS,
            Mutation::CategoryDeleted { .. } => CATEGORY_DELETE_TAGS,
            Mutation::TagCreated { .. } | Mutation::TagUpdated { .. } => TAG_TAGS,
            Mutation::TagDeleted { .. } => TAG_DELETE_TAGS,
            Mutation::CommentCreated { .. }
            | Mutation::CommentApproved { .. }
            | Mutation::CommentDeleted { .. } => COMMENT_TAGS,
            Mutation::AnalyticsRecorded => ANALYTICS_TAGS,
        }
    }

    /// Short description of the written record, e.g. `post p1 (ilk-yazi)`.
    pub fn subject(&self) -> String {
        match self {
            Mutation::PostCreated { id, slug }
            | Mutation::PostUpdated { id, slug }
            | Mutation::PostDeleted { id, slug } => format!("post {} ({})", id, slug),
            Mutation::CategoryCreated { id }
            | Mutation::CategoryUpdated { id }
            | Mutation::CategoryDeleted { id } => format!("category {}", id),
            Mutation::TagCreated { id } | Mutation::TagUpdated { id } | Mutation::TagDeleted { id } => {
                format!("tag {}", id)
            }
            Mutation::CommentCreated { post_id }
            | Mutation::CommentApproved { post_id }
            | Mutation::CommentDeleted { post_id } => format!("comments of post {}", post_id),
            Mutation::AnalyticsRecorded => "analytics".to_string(),
        }
    }
}

impl Cache {
    /// Invalidate every tag affected by `mutation`.
    ///
    /// Returns the number of cache entries removed.
    pub fn apply(&self, mutation: &Mutation) -> usize {
        let removed = self.invalidate_tags(mutation.tags());
        info!(
            "Write to {} invalidated {} cache entries",
            mutation.subject(),
            removed
        );
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_writes_invalidate_posts_and_homepage() {
        let m = Mutation::PostUpdated {
            id: "p1".to_string(),
            slug: "ilk-yazi".to_string(),
        };
        assert_eq!(m.tags(), &[CacheTag::Posts, CacheTag::Homepage]);
    }

    #[test]
    fn post_delete_also_invalidates_comments() {
        let m = Mutation::PostDeleted {
            id: "p1".to_string(),
            slug: "ilk-yazi".to_string(),
        };
        assert!(m.tags().contains(&CacheTag::Comments));
        assert!(m.tags().contains(&CacheTag::Homepage));
    }

    #[test]
    fn taxonomy_writes_invalidate_own_tag() {
        let id = "c1".to_string();
        assert_eq!(
            Mutation::CategoryUpdated { id: id.clone() }.tags(),
            &[CacheTag::Categories]
        );
        assert_eq!(Mutation::TagCreated { id }.tags(), &[CacheTag::Tags]);
    }

    #[test]
    fn taxonomy_deletes_invalidate_posts() {
        let id = "c1".to_string();
        for m in [
            Mutation::CategoryDeleted { id: id.clone() },
            Mutation::TagDeleted { id },
        ] {
            assert!(m.tags().contains(&CacheTag::Posts), "{:?}", m);
            assert!(m.tags().contains(&CacheTag::Homepage), "{:?}", m);
        }
    }

    #[test]
    fn subject_names_the_record() {
        let m = Mutation::PostCreated {
            id: "p1".to_string(),
            slug: "ilk-yazi".to_string(),
        };
        assert_eq!(m.subject(), "post p1 (ilk-yazi)");
        assert_eq!(
            Mutation::CommentApproved {
                post_id: "p1".to_string()
            }
            .subject(),
            "comments of post p1"
        );
    }

    #[test]
    fn every_tag_has_a_trigger() {
        let mutations = [
            Mutation::PostCreated {
                id: String::new(),
                slug: String::new(),
            },
            Mutation::CategoryCreated { id: String::new() },
            Mutation::TagCreated { id: String::new() },
            Mutation::CommentApproved {
                post_id: String::new(),
            },
            Mutation::AnalyticsRecorded,
        ];
        for tag in CacheTag::ALL {
            assert!(
                mutations.iter().any(|m| m.tags().contains(&tag)),
                "no mutation invalidates {}",
                tag
            );
        }
    }

    #[test]
    fn apply_removes_entries() {
        let cache = Cache::default();
        cache.store().set("homepage:[10]", vec![1], None);
        cache
            .registry()
            .register("homepage:[10]", &[CacheTag::Posts, CacheTag::Homepage]);

        let removed = cache.apply(&Mutation::PostCreated {
            id: "p2".to_string(),
            slug: "ikinci".to_string(),
        });

        assert_eq!(removed, 1);
        assert!(cache.store().is_empty());
    }
}
