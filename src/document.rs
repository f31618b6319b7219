//! Parsed HTML document handed through the inlining stages
//!
//! Wraps a kuchiki tree together with the URL it was loaded from. Stages
//! mutate the tree in place; [`Document::to_html`] serializes the result.

use anyhow::{Context, Result};
use kuchiki::traits::TendrilSink;
use kuchiki::{ElementData, NodeDataRef, NodeRef};

use crate::utils::resolve_url;

pub type Element = NodeDataRef<ElementData>;

#[derive(Debug, Clone)]
pub struct Document {
    root: NodeRef,
    url: Option<String>,
}

impl Document {
    /// Parse `html` loaded from `url` (if known)
    #[must_use]
    pub fn parse(html: &str, url: Option<&str>) -> Self {
        Self {
            root: kuchiki::parse_html().one(html),
            url: url.map(str::to_string),
        }
    }

    /// Wrap an already-parsed tree
    #[must_use]
    pub fn from_node(root: NodeRef, url: Option<String>) -> Self {
        Self { root, url }
    }

    #[must_use]
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// First `<base href>` resolved against the document URL, else the document URL
    #[must_use]
    pub fn base_url(&self) -> Option<String> {
        let base_href = self.root.select_first("base[href]").ok().and_then(|base| {
            base.attributes
                .borrow()
                .get("href")
                .map(str::to_string)
                .filter(|href| !href.trim().is_empty())
        });

        match base_href {
            Some(href) => Some(resolve_url(self.url.as_deref(), &href)),
            None => self.url.clone(),
        }
    }

    /// Elements matching `selector`, collected in document order
    ///
    /// Collecting up front keeps the list stable while callers detach or
    /// insert nodes.
    #[must_use]
    pub fn select_snapshot(&self, selector: &str) -> Vec<Element> {
        match self.root.select(selector) {
            Ok(matches) => matches.collect(),
            Err(()) => {
                log::warn!("Invalid selector: {selector}");
                Vec::new()
            }
        }
    }

    /// Serialize the (possibly mutated) tree back to HTML
    pub fn to_html(&self) -> Result<String> {
        let mut output = Vec::new();
        self.root
            .serialize(&mut output)
            .context("Failed to serialize document")?;
        String::from_utf8(output).context("Serialized document is not valid UTF-8")
    }
}

/// Attribute value of an element, if present
#[must_use]
pub fn attribute(element: &Element, name: &str) -> Option<String> {
    element.attributes.borrow().get(name).map(str::to_string)
}

pub fn set_attribute(element: &Element, name: &str, value: impl Into<String>) {
    element.attributes.borrow_mut().insert(name, value.into());
}

/// Detached, empty element named `tag`
///
/// Built by parsing a one-element fragment, the same way replacement
/// markup is produced elsewhere, so the node carries the HTML namespace.
#[must_use]
pub fn create_element(tag: &str) -> Option<NodeRef> {
    let fragment = kuchiki::parse_html().one(format!("<{tag}></{tag}>"));
    let element = fragment.select_first(tag).ok()?;
    let node = element.as_node().clone();
    node.detach();
    Some(node)
}

/// Replace every child of `node` by a single text node
pub fn set_text(node: &NodeRef, text: &str) {
    for child in node.children().collect::<Vec<_>>() {
        child.detach();
    }
    node.append(NodeRef::new_text(text));
}
