//! Inline `<img>` and `<input type=image>` sources as data URIs

use futures::future::join_all;

use super::types::{InliningError, ResourceType, StageOutcome};
use crate::config::InlineOptions;
use crate::document::{attribute, set_attribute, Document, Element};
use crate::fetch::ResourceFetcher;
use crate::utils::{is_data_uri, resolve_url, to_data_uri, IMAGE_DATA_URI_MIME};

fn is_image_element(element: &Element) -> bool {
    match &*element.name.local {
        "img" => true,
        "input" => attribute(element, "type").is_some_and(|kind| kind.eq_ignore_ascii_case("image")),
        _ => false,
    }
}

/// Image elements, in document order
#[must_use]
pub fn image_elements(doc: &Document) -> Vec<Element> {
    doc.select_snapshot("img, input")
        .into_iter()
        .filter(is_image_element)
        .collect()
}

pub fn apply_image_source(element: &Element, data_uri: &str) {
    set_attribute(element, "src", data_uri);
}

/// Fetch every external image source concurrently and replace it by a data URI
///
/// Elements without `src`, or whose `src` is already a `data:` URI, are
/// never fetched. A failure leaves the element untouched.
pub async fn inline_images<F: ResourceFetcher>(
    elements: &[Element],
    base: Option<&str>,
    fetcher: &F,
    options: &InlineOptions,
) -> StageOutcome<Option<String>> {
    let urls: Vec<Option<String>> = elements
        .iter()
        .map(|element| {
            attribute(element, "src")
                .filter(|src| !is_data_uri(src))
                .map(|src| resolve_url(base, &src))
        })
        .collect();

    let cache = options.cache();
    let fetched = join_all(urls.iter().map(|url| async move {
        let url = url.as_deref()?;
        log::debug!("Fetching image {url}");
        Some(fetcher.fetch_binary(url, cache).await)
    }))
    .await;

    let mut outcome = StageOutcome::default();
    for ((element, url), result) in elements.iter().zip(&urls).zip(fetched) {
        let (Some(url), Some(result)) = (url, result) else {
            outcome.results.push(None);
            continue;
        };

        match result {
            Ok(bytes) => {
                let data_uri = to_data_uri(IMAGE_DATA_URI_MIME, &bytes);
                apply_image_source(element, &data_uri);
                outcome.results.push(Some(data_uri));
            }
            Err(e) => {
                log::warn!("Failed to load image {url}: {e}");
                outcome
                    .errors
                    .push(InliningError::unable_to_load(ResourceType::Image, url.clone()));
                outcome.results.push(None);
            }
        }
    }

    log::debug!(
        "Image stage: {} elements, {} errors",
        elements.len(),
        outcome.errors.len()
    );
    outcome
}
