pub mod config;
pub mod css;
pub mod document;
pub mod fetch;
pub mod inline_css;
pub mod svg;
pub mod utils;

pub use config::{CacheMode, FetchConfig, InlineOptions, InlineOptionsBuilder};
pub use css::{parse_css_text, CssRule, RuleList};
pub use document::Document;
pub use fetch::{FetchError, HttpFetcher, ResourceFetcher};
pub use inline_css::{
    inline_html, inline_references, CacheBucket, InliningError, InliningResult, ResourceType,
};
pub use svg::{document_to_svg, SvgOptions};
pub use utils::resolve_url;

/// Inline every external resource of `html` and wrap the result into an SVG image
pub async fn rasterize_html<F: ResourceFetcher>(
    html: &str,
    document_url: Option<&str>,
    fetcher: &F,
    options: &InlineOptions,
    svg_options: SvgOptions,
) -> (String, Vec<InliningError>) {
    let doc = Document::parse(html, document_url);
    let errors = inline_references(&doc, fetcher, options).await;
    (document_to_svg(&doc, svg_options), errors)
}
