//! Shared configuration constants for resource inlining
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Chrome user agent string sent with every resource request
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
/// Next update: 2025-04-29 (quarterly schedule)
///
/// Some CDNs serve different (or no) content to unknown agents, most notably
/// font services that pick the font format from the user agent.
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Timeout for text resources (stylesheets, scripts): 30 seconds
pub const DEFAULT_TEXT_TIMEOUT_SECS: u64 = 30;

/// Timeout for binary resources (images, fonts): 60 seconds
pub const DEFAULT_BINARY_TIMEOUT_SECS: u64 = 60;

/// Maximum size for text downloads: 2MB
///
/// Based on 99th percentile of real-world CSS + margin.
/// Typical: 50-200KB, Large frameworks: 500KB-1MB
pub const DEFAULT_MAX_TEXT_SIZE: usize = 2 * 1024 * 1024;

/// Maximum size for binary downloads: 5MB
///
/// Images and fonts larger than this should not be inlined as data URLs.
/// Typical inlined images: 10-500KB, Large: 1-3MB
pub const DEFAULT_MAX_BINARY_SIZE: usize = 5 * 1024 * 1024;

/// MIME type used for every inlined image, background or `<img>`
pub const IMAGE_DATA_URI_MIME: &str = "image/png";

/// Query parameter name used for cache busting
pub const CACHE_BUSTER_PARAM: &str = "_";

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
