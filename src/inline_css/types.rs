//! Type definitions for resource inlining

use serde::{Deserialize, Serialize};

/// Resource type for error tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    Image,
    Stylesheet,
    BackgroundImage,
    FontFace,
    Script,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Image => write!(f, "image"),
            ResourceType::Stylesheet => write!(f, "stylesheet"),
            ResourceType::BackgroundImage => write!(f, "backgroundImage"),
            ResourceType::FontFace => write!(f, "fontFace"),
            ResourceType::Script => write!(f, "script"),
        }
    }
}

impl ResourceType {
    /// Noun used in user-facing failure messages
    fn label(self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Stylesheet => "stylesheet",
            ResourceType::BackgroundImage => "background-image",
            ResourceType::FontFace => "font-face",
            ResourceType::Script => "script",
        }
    }
}

/// Error information for a resource that could not be inlined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InliningError {
    pub resource_type: ResourceType,
    pub url: String,
    pub msg: String,
}

impl InliningError {
    /// `Unable to load <kind> <url>` for the given resource
    #[must_use]
    pub fn unable_to_load(resource_type: ResourceType, url: impl Into<String>) -> Self {
        let url = url.into();
        let msg = format!("Unable to load {} {url}", resource_type.label());
        Self {
            resource_type,
            url,
            msg,
        }
    }
}

impl std::fmt::Display for InliningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.resource_type, self.msg)
    }
}

/// Serialized document plus every resource that could not be inlined
#[derive(Debug, Clone, Serialize)]
pub struct InliningResult {
    pub html: String,
    pub errors: Vec<InliningError>,
}

impl InliningResult {
    /// Check if any failures occurred
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Per-element results of one stage, in snapshot order, plus its errors
#[derive(Debug, Clone)]
pub struct StageOutcome<T> {
    pub results: Vec<T>,
    pub errors: Vec<InliningError>,
}

impl<T> Default for StageOutcome<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// What the link stage did to one `<link rel=stylesheet>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Fetch failed; the link stays
    Untouched,
    /// The sheet serialized to nothing; the link is dropped
    Removed,
    /// The link is replaced by a `<style>` with this text
    Replaced(String),
}
