//! Rewrite relative references of a fetched stylesheet against its own URL
//!
//! Once the rules of a linked or imported sheet move into the document, their
//! relative `url()`s would otherwise resolve against the document instead.

use super::rules::{CssRule, RuleList};
use super::value_parser::{
    parse_background_declaration, parse_font_face_src, serialize_background_declaration,
    serialize_font_face_src, FontSource,
};
use crate::utils::{is_data_uri, resolve_url};

const BACKGROUND_PROPERTIES: [&str; 2] = ["background-image", "background"];

fn absolutize(base: &str, url: &str) -> Option<String> {
    if is_data_uri(url) {
        return None;
    }
    let resolved = resolve_url(Some(base), url);
    (resolved != url).then_some(resolved)
}

fn adjust_style_backgrounds(base: &str, rule: &mut CssRule) -> bool {
    let CssRule::Style(style) = rule else {
        return false;
    };

    let mut changed = false;
    for property in BACKGROUND_PROPERTIES {
        let Some(value) = style.declarations().get(property) else {
            continue;
        };

        let mut layers = parse_background_declaration(value);
        let mut layer_changed = false;
        for layer in &mut layers {
            if let Some(url) = layer.url.as_deref()
                && let Some(absolute) = absolutize(base, url)
            {
                layer.url = Some(absolute);
                layer_changed = true;
            }
        }

        if layer_changed {
            style.set_property(property, serialize_background_declaration(&layers));
            changed = true;
        }
    }
    changed
}

fn rule_needs_adjustment(base: &str, rule: &CssRule) -> bool {
    match rule {
        CssRule::Style(style) => BACKGROUND_PROPERTIES.iter().any(|property| {
            style.declarations().get(property).is_some_and(|value| {
                parse_background_declaration(value)
                    .iter()
                    .filter_map(|layer| layer.url.as_deref())
                    .any(|url| absolutize(base, url).is_some())
            })
        }),
        CssRule::Import(import) => absolutize(base, import.href()).is_some(),
        CssRule::FontFace(font_face) => font_face.descriptor("src").is_some_and(|src| {
            parse_font_face_src(src).iter().any(
                |source| matches!(source, FontSource::Url { url, .. } if absolutize(base, url).is_some()),
            )
        }),
        CssRule::Media(media) => media
            .rules()
            .iter()
            .any(|rule| rule_needs_adjustment(base, rule)),
        CssRule::Other(_) => false,
    }
}

/// Make every background, font and import reference in `rules` absolute
///
/// Returns true when any rule was rewritten. Rules inside `@media` groups
/// are adjusted too.
pub fn adjust_paths_of_css_resources(base: &str, rules: &mut RuleList) -> bool {
    let mut changed = false;

    for index in 0..rules.len() {
        let needs_change = rules
            .get(index)
            .is_some_and(|rule| rule_needs_adjustment(base, rule));
        if !needs_change {
            continue;
        }

        // Only touch rules that change so untouched ones keep their source text
        let Some(rule) = rules.get_mut(index) else {
            continue;
        };
        match rule {
            CssRule::Style(_) => changed |= adjust_style_backgrounds(base, rule),
            CssRule::Import(import) => {
                if let Some(absolute) = absolutize(base, import.href()) {
                    import.set_href(absolute);
                    changed = true;
                }
            }
            CssRule::FontFace(font_face) => {
                let Some(src) = font_face.descriptor("src") else {
                    continue;
                };
                let sources: Vec<FontSource> = parse_font_face_src(src)
                    .into_iter()
                    .map(|source| match source {
                        FontSource::Url { url, format } => FontSource::Url {
                            url: absolutize(base, &url).unwrap_or(url),
                            format,
                        },
                        other => other,
                    })
                    .collect();
                let rebuilt = font_face.rebuilt_with_src(serialize_font_face_src(&sources));
                *rule = CssRule::FontFace(rebuilt);
                changed = true;
            }
            CssRule::Media(media) => {
                changed |= adjust_paths_of_css_resources(base, media.rules_mut());
            }
            CssRule::Other(_) => {}
        }
    }

    changed
}
