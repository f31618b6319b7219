//! Resolve `@import` rules by splicing the imported sheets in place
//!
//! ## Architecture
//!
//! 1. A synchronous scan over the top-level `@import`s decides, per rule,
//!    whether it was already loaded (the rule is dropped) or has to be
//!    fetched (its URL is reserved in the [`AlreadyLoadedSet`] right away).
//! 2. All fetches run concurrently. Each fetched sheet gets its relative
//!    references rebased onto its own URL, which makes them relative to the
//!    document again, and its own imports resolved recursively against the
//!    caller's base and the same set. A nested import that fails therefore
//!    reports its rebased href.
//! 3. Results are applied back to front so earlier indices stay valid.
//!
//! Because URLs are reserved before any await, duplicate and cyclic imports
//! are fetched exactly once.

use std::cell::RefCell;
use std::collections::HashSet;

use futures::future::{join_all, LocalBoxFuture};
use futures::FutureExt;

use super::types::{InliningError, ResourceType};
use crate::config::InlineOptions;
use crate::css::{adjust_paths_of_css_resources, parse_css_text, CssRule, MediaRule, RuleList};
use crate::fetch::ResourceFetcher;
use crate::utils::resolve_url;

/// Absolute URLs of stylesheets already fetched during one stage call
#[derive(Debug, Default)]
pub struct AlreadyLoadedSet(RefCell<HashSet<String>>);

impl AlreadyLoadedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `url`; false if it was already present
    pub fn insert(&self, url: &str) -> bool {
        self.0.borrow_mut().insert(url.to_string())
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.0.borrow().contains(url)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// Result of resolving the imports of one rule list
#[derive(Debug, Clone, Default)]
pub struct ImportsOutcome {
    pub has_changes: bool,
    pub errors: Vec<InliningError>,
}

enum Edit {
    Remove,
    Splice(Vec<CssRule>),
}

struct ImportJob {
    index: usize,
    href: String,
    resolved: String,
    media: Option<String>,
}

/// Replace every top-level `@import` in `rules` with the rules it imports
///
/// A failed import stays in place and yields one `stylesheet` error carrying
/// the href as written. Sibling imports never abort each other.
pub fn load_css_imports_for_rules<'a, F: ResourceFetcher>(
    rules: &'a mut RuleList,
    loaded: &'a AlreadyLoadedSet,
    base: Option<&'a str>,
    fetcher: &'a F,
    options: &'a InlineOptions,
) -> LocalBoxFuture<'a, ImportsOutcome> {
    async move {
        let mut edits: Vec<(usize, Edit)> = Vec::new();
        let mut jobs = Vec::new();

        for (index, rule) in rules.iter().enumerate() {
            let CssRule::Import(import) = rule else {
                continue;
            };

            let resolved = resolve_url(base, import.href());
            if !loaded.insert(&resolved) {
                log::debug!("Dropping already loaded import {resolved}");
                edits.push((index, Edit::Remove));
                continue;
            }

            jobs.push(ImportJob {
                index,
                href: import.href().to_string(),
                resolved,
                media: (!import.applies_to_all_media()).then(|| import.media().to_string()),
            });
        }

        if jobs.is_empty() && edits.is_empty() {
            return ImportsOutcome::default();
        }

        let cache = options.cache();
        let fetched = join_all(jobs.into_iter().map(|job| async move {
            log::debug!("Fetching imported stylesheet {}", job.resolved);
            match fetcher.fetch_text(&job.resolved, cache).await {
                Ok(text) => {
                    let mut sheet = parse_css_text(&text);
                    adjust_paths_of_css_resources(&job.resolved, &mut sheet);
                    let nested = load_css_imports_for_rules(
                        &mut sheet,
                        loaded,
                        base,
                        fetcher,
                        options,
                    )
                    .await;
                    (job, Ok((sheet, nested.errors)))
                }
                Err(e) => {
                    log::warn!("Failed to load imported stylesheet {}: {e}", job.resolved);
                    (job, Err(()))
                }
            }
        }))
        .await;

        let mut errors = Vec::new();
        for (job, result) in fetched {
            match result {
                Ok((sheet, nested_errors)) => {
                    errors.extend(nested_errors);
                    let replacement = match job.media {
                        Some(media) => vec![CssRule::Media(MediaRule::new(media, sheet))],
                        None => sheet.into_rules(),
                    };
                    edits.push((job.index, Edit::Splice(replacement)));
                }
                Err(()) => errors.push(InliningError::unable_to_load(
                    ResourceType::Stylesheet,
                    job.href,
                )),
            }
        }

        let has_changes = !edits.is_empty();
        edits.sort_by(|a, b| b.0.cmp(&a.0));
        for (index, edit) in edits {
            match edit {
                Edit::Remove => {
                    rules.remove(index);
                }
                Edit::Splice(replacement) => rules.splice(index, replacement),
            }
        }

        ImportsOutcome {
            has_changes,
            errors,
        }
    }
    .boxed_local()
}
