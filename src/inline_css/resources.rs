//! Inline the images and fonts a stylesheet references
//!
//! Background layers and `@font-face` sources of every rule (including rules
//! nested in `@media`) are collected first, then fetched in one concurrent
//! fan-out, then written back. Rules with nothing to inline keep their
//! original text.

use futures::future::join_all;

use super::types::{InliningError, ResourceType};
use crate::config::InlineOptions;
use crate::css::{
    font_mime_type, parse_background_declaration, parse_font_face_src,
    serialize_background_declaration, serialize_font_face_src, BackgroundLayer, CssRule,
    FontSource, RuleList,
};
use crate::fetch::ResourceFetcher;
use crate::utils::{resolve_url, to_data_uri, IMAGE_DATA_URI_MIME};

const BACKGROUND_PROPERTIES: [&str; 2] = ["background-image", "background"];

/// Result of inlining the resources of one rule list
#[derive(Debug, Clone, Default)]
pub struct ResourcesOutcome {
    pub has_changes: bool,
    pub errors: Vec<InliningError>,
}

enum Candidate {
    Background {
        path: Vec<usize>,
        property: &'static str,
        layers: Vec<BackgroundLayer>,
    },
    FontFace {
        path: Vec<usize>,
        sources: Vec<FontSource>,
    },
}

impl Candidate {
    fn path(&self) -> &[usize] {
        match self {
            Candidate::Background { path, .. } | Candidate::FontFace { path, .. } => path,
        }
    }
}

/// One fetch: which candidate, which layer/source, and where
struct Job {
    candidate: usize,
    item: usize,
    written_url: String,
    resolved_url: String,
    mime: String,
    resource_type: ResourceType,
}

fn collect_candidates(rules: &RuleList, prefix: &[usize], out: &mut Vec<Candidate>) {
    for (index, rule) in rules.iter().enumerate() {
        let mut path = prefix.to_vec();
        path.push(index);
        match rule {
            CssRule::Style(style) => {
                for property in BACKGROUND_PROPERTIES {
                    let Some(value) = style.declarations().get(property) else {
                        continue;
                    };
                    let layers = parse_background_declaration(value);
                    if layers.iter().any(BackgroundLayer::is_inlinable) {
                        out.push(Candidate::Background {
                            path: path.clone(),
                            property,
                            layers,
                        });
                    }
                }
            }
            CssRule::FontFace(font_face) => {
                let Some(src) = font_face.descriptor("src") else {
                    continue;
                };
                let sources = parse_font_face_src(src);
                if sources.iter().any(FontSource::is_inlinable) {
                    out.push(Candidate::FontFace { path, sources });
                }
            }
            CssRule::Media(media) => collect_candidates(media.rules(), &path, out),
            CssRule::Import(_) | CssRule::Other(_) => {}
        }
    }
}

fn plan_jobs(candidates: &[Candidate], base: Option<&str>) -> Vec<Job> {
    let mut jobs = Vec::new();
    for (candidate_index, candidate) in candidates.iter().enumerate() {
        match candidate {
            Candidate::Background { layers, .. } => {
                for (item, layer) in layers.iter().enumerate() {
                    if !layer.is_inlinable() {
                        continue;
                    }
                    let Some(url) = layer.url.as_deref() else {
                        continue;
                    };
                    jobs.push(Job {
                        candidate: candidate_index,
                        item,
                        written_url: url.to_string(),
                        resolved_url: resolve_url(base, url),
                        mime: IMAGE_DATA_URI_MIME.to_string(),
                        resource_type: ResourceType::BackgroundImage,
                    });
                }
            }
            Candidate::FontFace { sources, .. } => {
                for (item, source) in sources.iter().enumerate() {
                    if !source.is_inlinable() {
                        continue;
                    }
                    let FontSource::Url { url, format } = source else {
                        continue;
                    };
                    jobs.push(Job {
                        candidate: candidate_index,
                        item,
                        written_url: url.clone(),
                        resolved_url: resolve_url(base, url),
                        mime: font_mime_type(format.as_deref()),
                        resource_type: ResourceType::FontFace,
                    });
                }
            }
        }
    }
    jobs
}

fn write_back(rules: &mut RuleList, candidate: &Candidate) -> bool {
    let path = candidate.path();
    let Some((&index, parents)) = path.split_last() else {
        return false;
    };
    let Some(list) = rules.list_at_path_mut(parents) else {
        return false;
    };

    match candidate {
        Candidate::Background {
            property, layers, ..
        } => match list.get_mut(index) {
            Some(CssRule::Style(style)) => {
                style.set_property(property, serialize_background_declaration(layers));
                true
            }
            _ => false,
        },
        Candidate::FontFace { sources, .. } => {
            let rebuilt = match list.get(index) {
                Some(CssRule::FontFace(font_face)) => {
                    font_face.rebuilt_with_src(serialize_font_face_src(sources))
                }
                _ => return false,
            };
            list.exchange(index, CssRule::FontFace(rebuilt)).is_some()
        }
    }
}

/// Fetch every external background image and font of `rules` and inline it as a data URI
///
/// References resolve against `base`. Each failing layer or font source
/// yields one error carrying the URL as written; the rest of the rule is
/// still inlined.
pub async fn load_and_inline_css_resources_for_rules<F: ResourceFetcher>(
    rules: &mut RuleList,
    base: Option<&str>,
    fetcher: &F,
    options: &InlineOptions,
) -> ResourcesOutcome {
    let mut candidates = Vec::new();
    collect_candidates(rules, &[], &mut candidates);
    if candidates.is_empty() {
        return ResourcesOutcome::default();
    }

    let jobs = plan_jobs(&candidates, base);
    let cache = options.cache();
    let responses = join_all(jobs.iter().map(|job| {
        log::debug!("Fetching {} {}", job.resource_type, job.resolved_url);
        fetcher.fetch_binary(&job.resolved_url, cache)
    }))
    .await;

    let mut errors = Vec::new();
    let mut inlined = vec![false; candidates.len()];

    for (job, response) in jobs.iter().zip(responses) {
        let bytes = match response {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Failed to inline {} {}: {e}", job.resource_type, job.written_url);
                errors.push(InliningError::unable_to_load(
                    job.resource_type,
                    job.written_url.clone(),
                ));
                continue;
            }
        };

        let data_uri = to_data_uri(&job.mime, &bytes);
        match &mut candidates[job.candidate] {
            Candidate::Background { layers, .. } => layers[job.item].url = Some(data_uri),
            Candidate::FontFace { sources, .. } => {
                if let FontSource::Url { url, .. } = &mut sources[job.item] {
                    *url = data_uri;
                }
            }
        }
        inlined[job.candidate] = true;
    }

    let mut has_changes = false;
    for (candidate, _) in candidates.iter().zip(&inlined).filter(|(_, inlined)| **inlined) {
        has_changes |= write_back(rules, candidate);
    }

    ResourcesOutcome {
        has_changes,
        errors,
    }
}
