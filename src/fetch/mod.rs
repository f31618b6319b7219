//! Resource fetching
//!
//! The inlining pipeline only talks to the network through the
//! [`ResourceFetcher`] trait, so tests can substitute a fetcher that serves
//! canned responses. [`HttpFetcher`] is the production implementation.

pub mod cache_buster;
pub mod http;

use std::future::Future;

use crate::config::CacheMode;

pub use http::HttpFetcher;

/// A failed fetch, carrying the URL that was requested
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{msg} ({url})")]
pub struct FetchError {
    pub url: String,
    pub msg: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            msg: msg.into(),
        }
    }
}

/// Text and binary GET of already-resolved URLs
///
/// The returned futures need not be `Send`: the inlining pipeline drives
/// them on a single task while it holds the (non-`Send`) DOM.
pub trait ResourceFetcher {
    fn fetch_text(
        &self,
        url: &str,
        cache: CacheMode,
    ) -> impl Future<Output = Result<String, FetchError>>;

    fn fetch_binary(
        &self,
        url: &str,
        cache: CacheMode,
    ) -> impl Future<Output = Result<Vec<u8>, FetchError>>;
}
