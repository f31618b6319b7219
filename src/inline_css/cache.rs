//! Caller-owned cache of complete inlining results
//!
//! A [`CacheBucket`] maps a normalized base URL (and the script setting) to
//! the per-element results of one error-free pipeline run. Replaying a
//! snapshot onto a structurally equal document reproduces the inlined output
//! without a single fetch. Documents that share a key share an entry,
//! whatever their content.

use dashmap::DashMap;
use std::sync::Arc;

use super::types::{InliningError, LinkOutcome};
use crate::utils::normalize_url_for_cache;

/// Bucket key for a base URL; runs with and without scripts never share an entry
#[must_use]
pub fn cache_key(base: &str, inline_scripts: bool) -> String {
    let key = normalize_url_for_cache(base);
    if inline_scripts {
        format!("{key} +scripts")
    } else {
        key
    }
}

/// Per-element results of one pipeline run, indexed like each stage's snapshot
#[derive(Debug, Clone, Default)]
pub struct InlinedSnapshot {
    pub image_sources: Vec<Option<String>>,
    pub links: Vec<LinkOutcome>,
    pub styles: Vec<Option<String>>,
    pub scripts: Vec<Option<String>>,
    pub errors: Vec<InliningError>,
}

/// Shared result cache, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct CacheBucket(Arc<DashMap<String, InlinedSnapshot>>);

impl CacheBucket {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<InlinedSnapshot> {
        self.0.get(key).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, key: String, snapshot: InlinedSnapshot) {
        self.0.insert(key, snapshot);
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&self) {
        self.0.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let bucket = CacheBucket::new();
        let other = bucket.clone();
        other.insert("http://example.com/".to_string(), InlinedSnapshot::default());

        assert!(bucket.contains("http://example.com/"));
        assert_eq!(bucket.len(), 1);
        bucket.clear();
        assert!(other.is_empty());
    }

    #[test]
    fn test_cache_key_separates_script_runs() {
        assert_eq!(
            cache_key("http://example.com:80/docs/#top", false),
            "http://example.com/docs"
        );
        assert_ne!(
            cache_key("http://example.com/", false),
            cache_key("http://example.com/", true)
        );
    }
}
