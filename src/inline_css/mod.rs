//! Resource inlining functionality
//!
//! This module turns a document's external references (images, stylesheet
//! links, `@import`s, background images, web fonts and optionally scripts)
//! into embedded content, producing a self-contained document.

// Sub-modules
pub mod cache;
pub mod images;
pub mod imports;
pub mod links;
pub mod orchestrator;
pub mod resources;
pub mod scripts;
pub mod styles;
pub mod types;

// Re-exports for public API
pub use cache::{CacheBucket, InlinedSnapshot};
pub use images::inline_images;
pub use imports::{load_css_imports_for_rules, AlreadyLoadedSet, ImportsOutcome};
pub use links::inline_links;
pub use orchestrator::{inline_html, inline_references};
pub use resources::{load_and_inline_css_resources_for_rules, ResourcesOutcome};
pub use scripts::inline_scripts;
pub use styles::inline_style_elements;
pub use types::{InliningError, InliningResult, LinkOutcome, ResourceType, StageOutcome};
