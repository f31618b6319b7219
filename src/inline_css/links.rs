//! Replace `<link rel=stylesheet>` elements by inline `<style>` elements

use futures::future::join_all;

use super::imports::AlreadyLoadedSet;
use super::styles::{inline_css_rules, is_css_type};
use super::types::{InliningError, LinkOutcome, ResourceType, StageOutcome};
use crate::config::InlineOptions;
use crate::css::{adjust_paths_of_css_resources, parse_css_text};
use crate::document::{attribute, create_element, set_text, Document, Element};
use crate::fetch::ResourceFetcher;
use crate::utils::resolve_url;

fn is_stylesheet_link(element: &Element) -> bool {
    let rel_is_stylesheet = attribute(element, "rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    });
    rel_is_stylesheet && is_css_type(element) && attribute(element, "href").is_some()
}

/// Stylesheet links with an `href`, in document order
#[must_use]
pub fn stylesheet_links(doc: &Document) -> Vec<Element> {
    doc.select_snapshot("link")
        .into_iter()
        .filter(is_stylesheet_link)
        .collect()
}

/// Apply one link result to the DOM
pub fn apply_link_outcome(link: &Element, outcome: &LinkOutcome) {
    let node = link.as_node();
    match outcome {
        LinkOutcome::Untouched => {}
        LinkOutcome::Removed => node.detach(),
        LinkOutcome::Replaced(css) => {
            match create_element("style") {
                Some(style) => {
                    set_text(&style, css);
                    node.insert_before(style);
                }
                None => {
                    log::warn!("Could not create <style> element; keeping stylesheet link");
                    return;
                }
            }
            node.detach();
        }
    }
}

/// Fetch every link's sheet concurrently and inline it
///
/// Each sheet is rebased onto its own URL first, which makes its references
/// relative to the document again. Whatever fails to inline then still
/// points at the right file.
/// A failed fetch leaves the link untouched and reports the resolved URL.
/// Links sharing a URL are fetched once and all get the same outcome.
pub async fn inline_links<F: ResourceFetcher>(
    links: &[Element],
    base: Option<&str>,
    fetcher: &F,
    options: &InlineOptions,
) -> StageOutcome<LinkOutcome> {
    let loaded = AlreadyLoadedSet::new();
    let mut unique: Vec<String> = Vec::new();
    let slots: Vec<usize> = links
        .iter()
        .map(|link| {
            let href = attribute(link, "href").unwrap_or_default();
            let url = resolve_url(base, &href);
            if loaded.insert(&url) {
                unique.push(url);
                unique.len() - 1
            } else {
                log::debug!("Stylesheet {url} is linked more than once");
                unique.iter().position(|seen| *seen == url).unwrap_or_default()
            }
        })
        .collect();

    let cache = options.cache();
    let loaded = &loaded;
    let results = join_all(unique.iter().map(|url| async move {
        log::debug!("Fetching stylesheet {url}");
        match fetcher.fetch_text(url, cache).await {
            Ok(text) => {
                let mut rules = parse_css_text(&text);
                adjust_paths_of_css_resources(url, &mut rules);
                Ok(inline_css_rules(rules, base, loaded, fetcher, options).await)
            }
            Err(e) => {
                log::warn!("Failed to load stylesheet {url}: {e}");
                Err(InliningError::unable_to_load(ResourceType::Stylesheet, url.clone()))
            }
        }
    }))
    .await;

    let mut outcome = StageOutcome::default();
    let sheets: Vec<LinkOutcome> = results
        .into_iter()
        .map(|result| match result {
            Ok(sheet) => {
                outcome.errors.extend(sheet.errors);
                let css = sheet.rules.to_css_text();
                if css.trim().is_empty() {
                    LinkOutcome::Removed
                } else {
                    LinkOutcome::Replaced(css)
                }
            }
            Err(error) => {
                outcome.errors.push(error);
                LinkOutcome::Untouched
            }
        })
        .collect();

    for (link, slot) in links.iter().zip(slots) {
        let link_outcome = sheets.get(slot).cloned().unwrap_or(LinkOutcome::Untouched);
        apply_link_outcome(link, &link_outcome);
        outcome.results.push(link_outcome);
    }

    log::debug!(
        "Link stage: {} links, {} sheets, {} errors",
        links.len(),
        unique.len(),
        outcome.errors.len()
    );
    outcome
}
