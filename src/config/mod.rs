//! Configuration module for resource inlining
//!
//! This module provides the `InlineOptions` struct and its builder, the
//! `CacheMode` caching policy and the `FetchConfig` download limits.

// Sub-modules
pub mod builder;
pub mod types;

// Re-exports for public API
pub use builder::InlineOptionsBuilder;
pub use types::{CacheMode, FetchConfig, InlineOptions};
