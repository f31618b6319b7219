//! Inline the imports and resources of `<style>` elements

use futures::future::join_all;

use super::imports::{load_css_imports_for_rules, AlreadyLoadedSet};
use super::resources::load_and_inline_css_resources_for_rules;
use super::types::{InliningError, StageOutcome};
use crate::config::InlineOptions;
use crate::css::{parse_css_text, RuleList};
use crate::document::{attribute, set_text, Document, Element};
use crate::fetch::ResourceFetcher;

/// A stylesheet after import resolution and resource inlining
pub(crate) struct InlinedSheet {
    pub rules: RuleList,
    pub has_changes: bool,
    pub errors: Vec<InliningError>,
}

/// Parse `text`, resolve its imports, then inline its resources, all against `base`
pub(crate) async fn inline_css_text<F: ResourceFetcher>(
    text: &str,
    base: Option<&str>,
    loaded: &AlreadyLoadedSet,
    fetcher: &F,
    options: &InlineOptions,
) -> InlinedSheet {
    inline_css_rules(parse_css_text(text), base, loaded, fetcher, options).await
}

pub(crate) async fn inline_css_rules<F: ResourceFetcher>(
    mut rules: RuleList,
    base: Option<&str>,
    loaded: &AlreadyLoadedSet,
    fetcher: &F,
    options: &InlineOptions,
) -> InlinedSheet {
    let imports = load_css_imports_for_rules(&mut rules, loaded, base, fetcher, options).await;
    let resources = load_and_inline_css_resources_for_rules(&mut rules, base, fetcher, options).await;

    let mut errors = imports.errors;
    errors.extend(resources.errors);
    InlinedSheet {
        rules,
        has_changes: imports.has_changes || resources.has_changes,
        errors,
    }
}

/// `type` absent or `text/css`
pub(crate) fn is_css_type(element: &Element) -> bool {
    attribute(element, "type").is_none_or(|kind| {
        let kind = kind.trim();
        kind.is_empty() || kind.eq_ignore_ascii_case("text/css")
    })
}

/// `<style>` elements holding CSS, in document order
#[must_use]
pub fn style_elements(doc: &Document) -> Vec<Element> {
    doc.select_snapshot("style")
        .into_iter()
        .filter(is_css_type)
        .collect()
}

pub fn apply_style_text(element: &Element, text: &str) {
    set_text(element.as_node(), text);
}

/// Inline every element of `elements` concurrently
///
/// An element's text is only replaced when its imports or resources
/// actually changed; the per-element result is that new text.
pub async fn inline_style_elements<F: ResourceFetcher>(
    elements: &[Element],
    base: Option<&str>,
    fetcher: &F,
    options: &InlineOptions,
) -> StageOutcome<Option<String>> {
    let texts: Vec<String> = elements
        .iter()
        .map(|element| element.as_node().text_contents())
        .collect();

    let loaded = AlreadyLoadedSet::new();
    let sheets = join_all(
        texts
            .iter()
            .map(|text| inline_css_text(text, base, &loaded, fetcher, options)),
    )
    .await;

    let mut outcome = StageOutcome::default();
    for (element, sheet) in elements.iter().zip(sheets) {
        outcome.errors.extend(sheet.errors);
        if sheet.has_changes {
            let text = sheet.rules.to_css_text();
            apply_style_text(element, &text);
            outcome.results.push(Some(text));
        } else {
            outcome.results.push(None);
        }
    }

    log::debug!(
        "Style stage: {} elements, {} rewritten, {} errors",
        elements.len(),
        outcome.results.iter().flatten().count(),
        outcome.errors.len()
    );
    outcome
}
