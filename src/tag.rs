//! Invalidation tags.
//!
//! The tag set is closed: a cached computation can only be scoped to one of
//! these, so invalidating an unknown tag does not compile.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named invalidation scope shared by cached computations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTag {
    Posts,
    Tags,
    Categories,
    Comments,
    Analytics,
    /// Homepage listings; derived from posts.
    Homepage,
}

impl CacheTag {
    pub const COUNT: usize = 6;

    /// Every tag, in declaration order.
    pub const ALL: [CacheTag; Self::COUNT] = [
        CacheTag::Posts,
        CacheTag::Tags,
        CacheTag::Categories,
        CacheTag::Comments,
        CacheTag::Analytics,
        CacheTag::Homepage,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheTag::Posts => "posts",
            CacheTag::Tags => "tags",
            CacheTag::Categories => "categories",
            CacheTag::Comments => "comments",
            CacheTag::Analytics => "analytics",
            CacheTag::Homepage => "homepage",
        }
    }

    /// Dense index into per-tag tables.
    pub(crate) const fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| Error::InvalidTag(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names_roundtrip() {
        for tag in CacheTag::ALL {
            assert_eq!(tag.as_str().parse::<CacheTag>(), Ok(tag));
            assert_eq!(tag.to_string(), tag.as_str());
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = "pages".parse::<CacheTag>().unwrap_err();
        assert_eq!(err, Error::InvalidTag("pages".to_string()));
    }

    #[test]
    fn test_indices_are_dense() {
        for (i, tag) in CacheTag::ALL.iter().enumerate() {
            assert_eq!(tag.index(), i);
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&CacheTag::Homepage).unwrap();
        assert_eq!(json, "\"homepage\"");
        let tag: CacheTag = serde_json::from_str("\"categories\"").unwrap();
        assert_eq!(tag, CacheTag::Categories);
    }
}
