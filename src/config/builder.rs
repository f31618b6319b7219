//! Fluent builder for `InlineOptions`
//!
//! All fields are optional, so unlike a typestate builder every state can
//! `build()`; the builder only exists to keep call sites readable.

use super::types::{CacheMode, InlineOptions};
use crate::inline_css::cache::CacheBucket;

#[derive(Debug, Clone, Default)]
pub struct InlineOptionsBuilder {
    base_url: Option<String>,
    cache: CacheMode,
    cache_bucket: Option<CacheBucket>,
    inline_scripts: bool,
}

impl InlineOptions {
    #[must_use]
    pub fn builder() -> InlineOptionsBuilder {
        InlineOptionsBuilder::default()
    }
}

impl InlineOptionsBuilder {
    /// Resolve relative references against this URL instead of the document's
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = if base_url.trim().is_empty() {
            None
        } else {
            Some(base_url)
        };
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }

    /// Share inlining results between calls that resolve to the same base URL
    #[must_use]
    pub fn cache_bucket(mut self, cache_bucket: CacheBucket) -> Self {
        self.cache_bucket = Some(cache_bucket);
        self
    }

    #[must_use]
    pub fn inline_scripts(mut self, inline_scripts: bool) -> Self {
        self.inline_scripts = inline_scripts;
        self
    }

    #[must_use]
    pub fn build(self) -> InlineOptions {
        InlineOptions {
            base_url: self.base_url,
            cache: self.cache,
            cache_bucket: self.cache_bucket,
            inline_scripts: self.inline_scripts,
        }
    }
}
