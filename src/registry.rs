//! Tag registry.
//!
//! Tracks which cache keys were produced under which tag, plus a generation
//! counter per tag. The key sets drive eager deletion on invalidation; the
//! generations let a computation that was running during an invalidation
//! detect that its result is already stale.

use crate::tag::CacheTag;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generations of a set of tags captured before a computation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagSnapshot {
    generations: Vec<(CacheTag, u64)>,
}

/// Tag → cache keys mapping with per-tag generations.
pub struct TagRegistry {
    keys: DashMap<CacheTag, HashSet<String>>,
    generations: [AtomicU64; CacheTag::COUNT],
}

impl TagRegistry {
    pub fn new() -> Self {
        TagRegistry {
            keys: DashMap::new(),
            generations: Default::default(),
        }
    }

    /// Record that `key` was produced by a computation tagged with `tags`.
    pub fn register(&self, key: &str, tags: &[CacheTag]) {
        for tag in tags {
            self.keys.entry(*tag).or_default().insert(key.to_string());
        }
    }

    /// Keys currently registered under `tag`.
    pub fn keys_for(&self, tag: CacheTag) -> HashSet<String> {
        self.keys
            .get(&tag)
            .map(|keys| keys.value().clone())
            .unwrap_or_default()
    }

    /// Number of keys registered under `tag`.
    pub fn key_count(&self, tag: CacheTag) -> usize {
        self.keys.get(&tag).map_or(0, |keys| keys.len())
    }

    /// Drop keys under `tag` for which `keep` returns false.
    ///
    /// Returns the number of keys dropped.
    pub fn retain(&self, tag: CacheTag, mut keep: impl FnMut(&str) -> bool) -> usize {
        let Some(mut keys) = self.keys.get_mut(&tag) else {
            return 0;
        };
        let before = keys.len();
        keys.retain(|key| keep(key));
        before - keys.len()
    }

    pub fn generation(&self, tag: CacheTag) -> u64 {
        self.generations[tag.index()].load(Ordering::SeqCst)
    }

    pub fn snapshot(&self, tags: &[CacheTag]) -> TagSnapshot {
        TagSnapshot {
            generations: tags.iter().map(|t| (*t, self.generation(*t))).collect(),
        }
    }

    /// True if none of the snapshot's tags were invalidated since it was taken.
    pub fn is_current(&self, snapshot: &TagSnapshot) -> bool {
        snapshot
            .generations
            .iter()
            .all(|(tag, generation)| self.generation(*tag) == *generation)
    }

    /// Advance the tag's generation and take every key registered under it.
    ///
    /// The generation moves first so a concurrent writer that registers after
    /// the drain still sees its snapshot as outdated. The taken keys are also
    /// dropped from other tags, since their entries are about to be deleted.
    pub fn invalidate(&self, tag: CacheTag) -> HashSet<String> {
        self.generations[tag.index()].fetch_add(1, Ordering::SeqCst);
        let removed = self
            .keys
            .remove(&tag)
            .map(|(_, keys)| keys)
            .unwrap_or_default();

        if !removed.is_empty() {
            for mut other in self.keys.iter_mut() {
                other.value_mut().retain(|key| !removed.contains(key));
            }
        }
        removed
    }

    /// Forget every key, bumping all generations.
    pub fn clear(&self) {
        for generation in &self.generations {
            generation.fetch_add(1, Ordering::SeqCst);
        }
        self.keys.clear();
    }

    /// Number of tags with at least one registered key.
    pub fn tag_count(&self) -> usize {
        self.keys.len()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}
