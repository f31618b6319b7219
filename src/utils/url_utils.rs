//! URL resolution and data URI utilities.
//!
//! This module provides the URL algebra used by every inlining stage:
//! resolving references against a (possibly relative) base, normalizing
//! cache keys, and building base64 data URIs.

use base64::Engine;
use url::Url;

/// Placeholder origin used to resolve references against a relative base.
const RELATIVE_BASE_ORIGIN: &str = "http://relative.invalid";

/// Resolve a potentially relative URL against an optional base URL
///
/// - An absolute `url` wins outright.
/// - Without a base, `url` is returned as written.
/// - A relative base (e.g. `css/site.css`) still merges paths, and the
///   result stays relative (`css/site.css` + `img.png` → `css/img.png`).
///
/// Query strings of http(s) results are re-encoded, fixing URLs from HTML
/// that carry unencoded special characters (e.g. Google Fonts URLs with
/// `:`, `,`, `@`, `;` in query strings).
#[must_use]
pub fn resolve_url(base_url: Option<&str>, url: &str) -> String {
    if let Ok(absolute) = Url::parse(url) {
        return reencode_query(absolute).to_string();
    }

    let Some(base) = base_url.filter(|base| !base.is_empty()) else {
        return url.to_string();
    };

    match Url::parse(base) {
        Ok(base) => match base.join(url) {
            Ok(resolved) => reencode_query(resolved).to_string(),
            Err(e) => {
                log::debug!("Failed to resolve '{url}' against '{base}': {e}");
                url.to_string()
            }
        },
        Err(_) => resolve_against_relative_base(base, url),
    }
}

fn resolve_against_relative_base(base: &str, url: &str) -> String {
    let resolved = Url::parse(&format!("{RELATIVE_BASE_ORIGIN}/"))
        .and_then(|root| root.join(base))
        .and_then(|base| base.join(url));

    let Ok(resolved) = resolved else {
        return url.to_string();
    };

    let serialized = reencode_query(resolved).to_string();
    match serialized.strip_prefix(RELATIVE_BASE_ORIGIN) {
        Some(path) if base.starts_with('/') => path.to_string(),
        Some(path) => path.trim_start_matches('/').to_string(),
        None => serialized,
    }
}

fn reencode_query(mut resolved: Url) -> Url {
    if !matches!(resolved.scheme(), "http" | "https") || resolved.query().is_none() {
        return resolved;
    }

    // Collect query pairs into owned strings to avoid borrow conflicts
    let query_pairs: Vec<(String, String)> = resolved
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    resolved.query_pairs_mut().clear();
    for (key, value) in query_pairs {
        resolved.query_pairs_mut().append_pair(&key, &value);
    }

    resolved
}

/// Normalize URL for consistent cache key generation
///
/// Semantically identical URLs produce the same key:
/// - Parse URL and serialize back to canonical form
/// - Remove default ports (80 for http, 443 for https)
/// - Remove trailing slashes from paths (except root "/")
/// - Drop the fragment
#[must_use]
pub fn normalize_url_for_cache(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.trim().to_string();
    };

    if let Some(port) = parsed.port() {
        let scheme = parsed.scheme();
        if (scheme == "http" && port == 80) || (scheme == "https" && port == 443) {
            let _ = parsed.set_port(None);
        }
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.set_fragment(None);
    parsed.to_string()
}

/// Check whether a reference is already an embedded `data:` URI
#[must_use]
pub fn is_data_uri(url: &str) -> bool {
    url.trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Encode bytes as a base64 `data:` URI with the given MIME type
#[must_use]
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    let encoded_capacity = base64::encoded_len(bytes.len(), true).unwrap_or(0);
    let mut encoded = String::with_capacity(encoded_capacity + 13 + mime.len());

    encoded.push_str("data:");
    encoded.push_str(mime);
    encoded.push_str(";base64,");

    base64::engine::general_purpose::STANDARD.encode_string(bytes, &mut encoded);

    encoded
}
