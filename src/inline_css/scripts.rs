//! Inline external `<script src>` elements

use futures::future::join_all;

use super::types::{InliningError, ResourceType, StageOutcome};
use crate::config::InlineOptions;
use crate::document::{attribute, create_element, set_text, Document, Element};
use crate::fetch::ResourceFetcher;
use crate::utils::resolve_url;

/// `<script src>` elements, in document order
#[must_use]
pub fn script_elements(doc: &Document) -> Vec<Element> {
    doc.select_snapshot("script[src]")
}

/// Keep an inlined body from closing its own element
fn escape_script_body(text: &str) -> String {
    text.replace("</script>", "<\\/script>")
}

/// Swap `script` for an inline script holding `body`, keeping its `type`
pub fn replace_script(script: &Element, body: &str) {
    let Some(replacement) = create_element("script") else {
        log::warn!("Could not create <script> element; keeping external script");
        return;
    };

    if let (Some(kind), Some(element)) = (attribute(script, "type"), replacement.as_element()) {
        element.attributes.borrow_mut().insert("type", kind);
    }
    set_text(&replacement, &escape_script_body(body));

    let node = script.as_node();
    node.insert_before(replacement);
    node.detach();
}

/// Fetch every external script concurrently and inline its text
pub async fn inline_scripts<F: ResourceFetcher>(
    elements: &[Element],
    base: Option<&str>,
    fetcher: &F,
    options: &InlineOptions,
) -> StageOutcome<Option<String>> {
    let urls: Vec<String> = elements
        .iter()
        .map(|script| resolve_url(base, &attribute(script, "src").unwrap_or_default()))
        .collect();

    let cache = options.cache();
    let fetched = join_all(urls.iter().map(|url| {
        log::debug!("Fetching script {url}");
        fetcher.fetch_text(url, cache)
    }))
    .await;

    let mut outcome = StageOutcome::default();
    for ((script, url), result) in elements.iter().zip(&urls).zip(fetched) {
        match result {
            Ok(body) => {
                replace_script(script, &body);
                outcome.results.push(Some(body));
            }
            Err(e) => {
                log::warn!("Failed to load script {url}: {e}");
                outcome
                    .errors
                    .push(InliningError::unable_to_load(ResourceType::Script, url.clone()));
                outcome.results.push(None);
            }
        }
    }
    outcome
}
