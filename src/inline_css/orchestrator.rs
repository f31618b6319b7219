//! Resource inlining orchestration
//!
//! Runs the stages over one document in a fixed order:
//! images, stylesheet links, `<style>` elements, then scripts (only when
//! `inline_scripts` is set). Errors are concatenated in stage order.
//!
//! `<style>` elements are snapshotted before the link stage runs, so the
//! styles produced from links are not processed twice.

use anyhow::Result;

use super::cache::{cache_key, InlinedSnapshot};
use super::images::{apply_image_source, image_elements, inline_images};
use super::links::{apply_link_outcome, inline_links, stylesheet_links};
use super::scripts::{inline_scripts, replace_script, script_elements};
use super::styles::{apply_style_text, inline_style_elements, style_elements};
use super::types::{InliningError, InliningResult};
use crate::config::InlineOptions;
use crate::document::{Document, Element};
use crate::fetch::ResourceFetcher;

fn replay<T>(elements: &[Element], results: &[T], mut apply: impl FnMut(&Element, &T)) {
    if elements.len() != results.len() {
        log::debug!(
            "Cached result covers {} elements, document has {}",
            results.len(),
            elements.len()
        );
    }
    for (element, result) in elements.iter().zip(results) {
        apply(element, result);
    }
}

fn replay_snapshot(doc: &Document, snapshot: &InlinedSnapshot, options: &InlineOptions) {
    let styles = style_elements(doc);

    replay(&image_elements(doc), &snapshot.image_sources, |element, source| {
        if let Some(source) = source {
            apply_image_source(element, source);
        }
    });
    replay(&stylesheet_links(doc), &snapshot.links, apply_link_outcome);
    replay(&styles, &snapshot.styles, |element, text| {
        if let Some(text) = text {
            apply_style_text(element, text);
        }
    });
    if options.inline_scripts() {
        replay(&script_elements(doc), &snapshot.scripts, |element, body| {
            if let Some(body) = body {
                replace_script(element, body);
            }
        });
    }
}

async fn run_stages<F: ResourceFetcher>(
    doc: &Document,
    base: Option<&str>,
    fetcher: &F,
    options: &InlineOptions,
) -> InlinedSnapshot {
    let styles = style_elements(doc);

    let images = inline_images(&image_elements(doc), base, fetcher, options).await;
    let links = inline_links(&stylesheet_links(doc), base, fetcher, options).await;
    let style_outcome = inline_style_elements(&styles, base, fetcher, options).await;
    let scripts = if options.inline_scripts() {
        inline_scripts(&script_elements(doc), base, fetcher, options).await
    } else {
        Default::default()
    };

    let mut errors = images.errors;
    errors.extend(links.errors);
    errors.extend(style_outcome.errors);
    errors.extend(scripts.errors);

    InlinedSnapshot {
        image_sources: images.results,
        links: links.results,
        styles: style_outcome.results,
        scripts: scripts.results,
        errors,
    }
}

/// Inline every external reference of `doc` in place
///
/// Returns the resources that could not be inlined. With a cache bucket and
/// a resolvable base URL, a previous result for the same base URL and script
/// setting is replayed without fetching anything. Only runs without errors
/// are stored.
pub async fn inline_references<F: ResourceFetcher>(
    doc: &Document,
    fetcher: &F,
    options: &InlineOptions,
) -> Vec<InliningError> {
    let base = options.effective_base_url(doc.base_url());

    let bucket_entry = options
        .cache_bucket()
        .zip(base.as_deref())
        .map(|(bucket, base)| (bucket, cache_key(base, options.inline_scripts())));

    if let Some((bucket, key)) = &bucket_entry
        && let Some(snapshot) = bucket.get(key)
    {
        log::info!("Replaying cached inlining result for {key}");
        replay_snapshot(doc, &snapshot, options);
        return snapshot.errors;
    }

    let snapshot = run_stages(doc, base.as_deref(), fetcher, options).await;
    let errors = snapshot.errors.clone();

    log::info!(
        "Inlined references of {}: {} errors",
        base.as_deref().unwrap_or("<document>"),
        errors.len()
    );

    if let Some((bucket, key)) = bucket_entry {
        if errors.is_empty() {
            bucket.insert(key, snapshot);
        } else {
            log::debug!("Not caching result for {key}: {} errors", errors.len());
        }
    }
    errors
}

/// Parse `html`, inline its references, and serialize the result
///
/// # Errors
///
/// Fails only when the resulting document cannot be serialized; resource
/// failures are reported in [`InliningResult::errors`].
pub async fn inline_html<F: ResourceFetcher>(
    html: &str,
    document_url: Option<&str>,
    fetcher: &F,
    options: &InlineOptions,
) -> Result<InliningResult> {
    let doc = Document::parse(html, document_url);
    let errors = inline_references(&doc, fetcher, options).await;
    Ok(InliningResult {
        html: doc.to_html()?,
        errors,
    })
}
