//! Cache key management utilities.

use crate::error::{Error, Result};
use serde::Serialize;
use std::borrow::Cow;

/// Builder for cache keys.
///
/// A key is the computation's key parts followed by a canonical JSON rendering
/// of the call arguments, e.g. `post:by-slug:["merhaba-dunya"]`.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Build the full key for a call of a cached computation.
    ///
    /// Arguments go through `serde_json::Value`, whose maps are sorted, so
    /// structurally equal arguments always render to the same string even when
    /// they contain hash maps.
    ///
    /// # Errors
    ///
    /// - `Error::ConfigError`: `parts` is empty
    /// - `Error::SerializationError`: the arguments cannot be represented as
    ///   JSON (e.g. a map with non-string keys)
    pub fn build<A: Serialize + ?Sized>(parts: &[String], args: &A) -> Result<String> {
        if parts.is_empty() {
            return Err(Error::ConfigError(
                "cached computation needs at least one key part".to_string(),
            ));
        }
        let canonical = serde_json::to_value(args)?;
        let rendered = serde_json::to_string(&canonical)?;
        Ok(format!("{}:{}", Self::build_composite(parts), rendered))
    }

    /// Build composite key from multiple parts.
    ///
    /// `:` and `\` inside a part are backslash-escaped, so `["a:b"]` and
    /// `["a", "b"]` stay distinct.
    pub fn build_composite<S: AsRef<str>>(parts: &[S]) -> String {
        parts
            .iter()
            .map(|part| escape_part(part.as_ref()))
            .collect::<Vec<_>>()
            .join(":")
    }
}

fn escape_part(part: &str) -> Cow<'_, str> {
    if !part.contains(|c| c == ':' || c == '\\') {
        return Cow::Borrowed(part);
    }
    let mut escaped = String::with_capacity(part.len() + 2);
    for ch in part.chars() {
        if ch == ':' || ch == '\\' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parts(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_key_contains_parts_and_args() {
        let key = CacheKeyBuilder::build(&parts(&["post", "by-slug"]), &("merhaba",)).unwrap();
        assert_eq!(key, "post:by-slug:[\"merhaba\"]");
    }

    #[test]
    fn test_unit_args() {
        let key = CacheKeyBuilder::build(&parts(&["categories"]), &()).unwrap();
        assert_eq!(key, "categories:null");
    }

    #[test]
    fn test_equal_maps_produce_same_key() {
        let mut a = HashMap::new();
        let mut b = HashMap::new();
        for i in 0..32 {
            a.insert(format!("k{}", i), i);
        }
        for i in (0..32).rev() {
            b.insert(format!("k{}", i), i);
        }

        let ka = CacheKeyBuilder::build(&parts(&["search"]), &a).unwrap();
        let kb = CacheKeyBuilder::build(&parts(&["search"]), &b).unwrap();
        assert_eq!(ka, kb);
    }

    #[test]
    fn test_distinct_args_produce_distinct_keys() {
        let p = parts(&["posts", "page"]);
        let k1 = CacheKeyBuilder::build(&p, &(1u32, "a:b")).unwrap();
        let k2 = CacheKeyBuilder::build(&p, &(1u32, "a")).unwrap();
        let k3 = CacheKeyBuilder::build(&p, &(2u32, "a:b")).unwrap();
        assert_ne!(k1, k2);
        assert_ne!(k1, k3);
    }

    #[test]
    fn test_composite_key_builder() {
        let key = CacheKeyBuilder::build_composite(&["post", "123", "comments"]);
        assert_eq!(key, "post:123:comments");
    }

    #[test]
    fn test_parts_with_separator_do_not_collide() {
        let joined = CacheKeyBuilder::build(&parts(&["a:b"]), &()).unwrap();
        let split = CacheKeyBuilder::build(&parts(&["a", "b"]), &()).unwrap();
        assert_ne!(joined, split);
        assert_eq!(joined, "a\\:b:null");

        let slash = CacheKeyBuilder::build(&parts(&["a\\", "b"]), &()).unwrap();
        assert_ne!(slash, joined);
    }

    #[test]
    fn test_empty_parts_rejected() {
        let err = CacheKeyBuilder::build(&[], &("merhaba",)).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
