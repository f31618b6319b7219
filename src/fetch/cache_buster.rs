//! Cache-busting query parameters for `CacheMode::None` and `CacheMode::Repeated`

use crate::config::CacheMode;
use crate::utils::CACHE_BUSTER_PARAM;

/// A fresh buster value: the current time in milliseconds
#[must_use]
pub fn fresh_buster() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

/// Append the cache-busting parameter to `url` according to `mode`
///
/// `repeated_buster` is consulted only for `CacheMode::Repeated`, and is
/// expected to stay the same for the lifetime of a fetcher.
#[must_use]
pub fn augment_url(url: &str, mode: CacheMode, repeated_buster: &str) -> String {
    let buster = match mode {
        CacheMode::Default => return url.to_string(),
        CacheMode::None => fresh_buster(),
        CacheMode::Repeated => repeated_buster.to_string(),
    };

    // The fragment never reaches the server, the parameter goes before it
    let (without_fragment, fragment) = match url.find('#') {
        Some(index) => url.split_at(index),
        None => (url, ""),
    };
    let separator = if without_fragment.contains('?') { '&' } else { '?' };

    format!("{without_fragment}{separator}{CACHE_BUSTER_PARAM}={buster}{fragment}")
}
