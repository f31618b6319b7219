//! Core configuration types for resource inlining
//!
//! This module contains the `InlineOptions` struct that flows through every
//! inlining stage, the `CacheMode` HTTP caching policy, and the `FetchConfig`
//! limits used by the HTTP fetcher.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::inline_css::cache::CacheBucket;
use crate::utils::{
    CHROME_USER_AGENT, DEFAULT_BINARY_TIMEOUT_SECS, DEFAULT_MAX_BINARY_SIZE,
    DEFAULT_MAX_TEXT_SIZE, DEFAULT_TEXT_TIMEOUT_SECS,
};

/// HTTP caching policy applied to every resource request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Let HTTP caches behave normally
    #[default]
    Default,
    /// Append a fresh cache-busting parameter to every request
    #[serde(alias = "false")]
    None,
    /// Bust the cache once, then reuse the same buster for later requests
    Repeated,
}

impl FromStr for CacheMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "true" => Ok(CacheMode::Default),
            "none" | "false" => Ok(CacheMode::None),
            "repeated" => Ok(CacheMode::Repeated),
            other => Err(format!(
                "Unknown cache mode '{other}' (expected default, none or repeated)"
            )),
        }
    }
}

impl std::fmt::Display for CacheMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheMode::Default => write!(f, "default"),
            CacheMode::None => write!(f, "none"),
            CacheMode::Repeated => write!(f, "repeated"),
        }
    }
}

/// Options recognized by the inlining orchestrator and every sub-stage
#[derive(Debug, Clone, Default)]
pub struct InlineOptions {
    /// Overrides the document's own base URL for all relative resolution
    pub(crate) base_url: Option<String>,
    pub(crate) cache: CacheMode,
    /// Replays a previous inlining result for the same base URL.
    pub(crate) cache_bucket: Option<CacheBucket>,
    /// Scripts are only worth fetching when the caller will execute them.
    pub(crate) inline_scripts: bool,
}

impl InlineOptions {
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    #[must_use]
    pub fn cache(&self) -> CacheMode {
        self.cache
    }

    #[must_use]
    pub fn cache_bucket(&self) -> Option<&CacheBucket> {
        self.cache_bucket.as_ref()
    }

    #[must_use]
    pub fn inline_scripts(&self) -> bool {
        self.inline_scripts
    }

    /// Base URL for a document: the explicit option wins over the document's own
    #[must_use]
    pub fn effective_base_url(&self, document_base: Option<String>) -> Option<String> {
        self.base_url.clone().or(document_base)
    }
}

/// Configuration for download timeouts and size limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Timeout for stylesheet and script downloads
    pub text_timeout: Duration,
    /// Timeout for image and font downloads
    pub binary_timeout: Duration,

    /// Maximum size for text downloads (bytes)
    pub max_text_size: usize,

    /// Maximum size for binary downloads (bytes)
    /// Resources larger than this should not be inlined as data URLs
    pub max_binary_size: usize,

    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            text_timeout: Duration::from_secs(DEFAULT_TEXT_TIMEOUT_SECS),
            binary_timeout: Duration::from_secs(DEFAULT_BINARY_TIMEOUT_SECS),
            max_text_size: DEFAULT_MAX_TEXT_SIZE,
            max_binary_size: DEFAULT_MAX_BINARY_SIZE,
            user_agent: CHROME_USER_AGENT.to_string(),
        }
    }
}
