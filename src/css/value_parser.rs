//! Parsers for the CSS micro-grammars the inliner rewrites
//!
//! - `url(...)` tokens
//! - multi-layer `background` / `background-image` values
//! - `@font-face` `src` reference lists
//!
//! None of these is a full CSS tokenizer. Values outside the modelled
//! grammar are reported as "nothing to inline" and left alone by callers.

use lazy_static::lazy_static;
use regex::Regex;

use super::scanner::{split_top_level, split_top_level_whitespace};

/// A token that was expected to be `url(...)` but is not
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CssUrlError {
    #[error("Invalid url: {0}")]
    InvalidUrl(String),
}

lazy_static! {
    // These patterns are hardcoded and syntactically valid regular expressions.
    // If they fail to compile, it indicates a compile-time bug in the pattern strings.
    static ref URL_REGEX: Regex =
        Regex::new(r#"^url\(("[^"]+"|'[^']+'|[^)]+)\)"#)
            .expect("BUG: hardcoded url() regex is invalid - this is a compile-time bug");

    static ref LOCAL_REGEX: Regex =
        Regex::new(r#"^local\((?:"([^"]*)"|'([^']*)'|([^)"']*))\)$"#)
            .expect("BUG: hardcoded local() regex is invalid - this is a compile-time bug");

    static ref URL_WITH_FORMAT_REGEX: Regex =
        Regex::new(r#"^(url\((?:"[^"]*"|'[^']*'|[^)"']*)\))(?:[\t\r\n\x0C ]+format\((?:"([^"]*)"|'([^']*)'|([^)"']*))\))?$"#)
            .expect("BUG: hardcoded url()+format() regex is invalid - this is a compile-time bug");

    static ref BACKGROUND_VALUE_REGEX: Regex = {
        let token = r#"(?:url\((?:"[^"]*"|'[^']*'|[^)"']*)\)|"[^"]*"|'[^']*'|[^\s,()"']+(?:\([^()]*\))?)"#;
        let layer = format!(r"{token}(?:\s+{token})*");
        Regex::new(&format!(r"^\s*{layer}(?:\s*,\s*{layer})*\s*$"))
            .expect("BUG: hardcoded background value regex is invalid - this is a compile-time bug")
    };
}

/// Strip the CSS whitespace class (tab, CR, FF, LF, space) from both ends
///
/// Other Unicode whitespace is significant inside `url()` and is kept.
fn trim_css_whitespace(value: &str) -> &str {
    value.trim_matches(|c| matches!(c, '\t' | '\r' | '\n' | '\x0C' | ' '))
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Unwrap a `url(...)` token into the bare URL
///
/// # Errors
///
/// Returns `CssUrlError::InvalidUrl` for anything that is not `url(...)`,
/// e.g. `local(...)`, a bare keyword, or garbage.
pub fn extract_css_url(token: &str) -> Result<String, CssUrlError> {
    let captures = URL_REGEX
        .captures(token)
        .ok_or_else(|| CssUrlError::InvalidUrl(token.to_string()))?;
    let inner = trim_css_whitespace(&captures[1]);
    Ok(unquote(inner).to_string())
}

/// Wrap a URL into a double-quoted `url("...")` token
#[must_use]
pub fn serialize_url(url: &str) -> String {
    format!("url(\"{url}\")")
}

/// One comma-separated layer of a `background` value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackgroundLayer {
    pub pre_url: Vec<String>,
    pub url: Option<String>,
    pub post_url: Vec<String>,
}

impl BackgroundLayer {
    /// True for layers referencing an external (non `data:`) resource
    #[must_use]
    pub fn is_inlinable(&self) -> bool {
        self.url
            .as_deref()
            .is_some_and(|url| !crate::utils::is_data_uri(url))
    }
}

/// Parse a `background` / `background-image` value into its layers
///
/// Returns an empty list when the value uses syntax outside the supported
/// grammar (e.g. nested functions like `linear-gradient(rgba(...), red)`).
#[must_use]
pub fn parse_background_declaration(text: &str) -> Vec<BackgroundLayer> {
    if !BACKGROUND_VALUE_REGEX.is_match(text) {
        return Vec::new();
    }

    split_top_level(text, b',')
        .into_iter()
        .map(|layer| {
            let tokens: Vec<String> = split_top_level_whitespace(layer)
                .into_iter()
                .map(str::to_string)
                .collect();

            match tokens.iter().position(|token| extract_css_url(token).is_ok()) {
                Some(index) => BackgroundLayer {
                    pre_url: tokens[..index].to_vec(),
                    url: extract_css_url(&tokens[index]).ok(),
                    post_url: tokens[index + 1..].to_vec(),
                },
                None => BackgroundLayer {
                    pre_url: tokens,
                    url: None,
                    post_url: Vec::new(),
                },
            }
        })
        .collect()
}

#[must_use]
pub fn serialize_background_declaration(layers: &[BackgroundLayer]) -> String {
    layers
        .iter()
        .map(|layer| {
            let mut parts: Vec<String> = layer.pre_url.clone();
            if let Some(url) = &layer.url {
                parts.push(serialize_url(url));
            }
            parts.extend(layer.post_url.iter().cloned());
            parts.join(" ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// One alternative in an `@font-face` `src` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    Local(String),
    Url { url: String, format: Option<String> },
    /// A reference outside the supported grammar, kept verbatim
    Raw(String),
}

impl FontSource {
    #[must_use]
    pub fn is_inlinable(&self) -> bool {
        matches!(self, FontSource::Url { url, .. } if !crate::utils::is_data_uri(url))
    }

    fn to_css(&self) -> String {
        match self {
            FontSource::Local(name) => format!("local(\"{name}\")"),
            FontSource::Url { url, format: None } => serialize_url(url),
            FontSource::Url {
                url,
                format: Some(format),
            } => format!("{} format(\"{format}\")", serialize_url(url)),
            FontSource::Raw(text) => text.clone(),
        }
    }
}

fn first_group(captures: &regex::Captures<'_>, groups: &[usize]) -> Option<String> {
    groups
        .iter()
        .find_map(|&group| captures.get(group))
        .map(|m| trim_css_whitespace(m.as_str()).to_string())
}

/// Parse an `@font-face` `src` value, preserving order and alternation
#[must_use]
pub fn parse_font_face_src(text: &str) -> Vec<FontSource> {
    split_top_level(text, b',')
        .into_iter()
        .map(trim_css_whitespace)
        .filter(|reference| !reference.is_empty())
        .map(|reference| {
            if let Some(captures) = LOCAL_REGEX.captures(reference) {
                return FontSource::Local(first_group(&captures, &[1, 2, 3]).unwrap_or_default());
            }

            if let Some(captures) = URL_WITH_FORMAT_REGEX.captures(reference)
                && let Ok(url) = extract_css_url(&captures[1])
            {
                return FontSource::Url {
                    url,
                    format: first_group(&captures, &[2, 3, 4]),
                };
            }

            log::debug!("Leaving unsupported font-face source as-is: {reference}");
            FontSource::Raw(reference.to_string())
        })
        .collect()
}

#[must_use]
pub fn serialize_font_face_src(sources: &[FontSource]) -> String {
    sources
        .iter()
        .map(FontSource::to_css)
        .collect::<Vec<_>>()
        .join(", ")
}

/// MIME type for an inlined font, derived from its `format()` hint
#[must_use]
pub fn font_mime_type(format: Option<&str>) -> String {
    match format.map(|f| f.trim().to_ascii_lowercase()) {
        None => "font/woff".to_string(),
        Some(format) => match format.as_str() {
            "woff" => "font/woff".to_string(),
            "woff2" => "font/woff2".to_string(),
            "truetype" => "font/truetype".to_string(),
            "opentype" => "font/opentype".to_string(),
            _ => format!("font/{format}"),
        },
    }
}
