//! Command-line front end: inline every resource of a page and print the result.
//!
//! The document is printed as HTML, or wrapped into an SVG image with `--svg`.
//! Resources that could not be inlined are reported on stderr; they never
//! change the exit code.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use kodegen_tools_rasterize::{
    document_to_svg, inline_references, CacheMode, Document, FetchConfig,
    HttpFetcher, InlineOptions, ResourceFetcher, SvgOptions,
};
use url::Url;

#[derive(Parser, Debug)]
#[command(
    name = "kodegen-rasterize",
    version,
    about = "Inline a page's images, stylesheets and fonts into one self-contained document"
)]
struct Cli {
    /// URL (http, https or file) or local path of the HTML document
    source: String,

    /// Resolve relative references against this URL instead of the document's
    #[arg(long)]
    base_url: Option<String>,

    /// HTTP caching policy: default, none or repeated
    #[arg(long, default_value = "default")]
    cache: CacheMode,

    /// Also inline external scripts
    #[arg(long, action = ArgAction::SetTrue)]
    inline_scripts: bool,

    /// Wrap the result into an SVG image of size WxH (e.g., 1024x768)
    #[arg(long, value_parser = parse_size, value_name = "WxH")]
    svg: Option<(u32, u32)>,

    /// Zoom factor applied inside the SVG image
    #[arg(long, default_value = "1.0")]
    zoom: f64,

    /// Print errors to stderr as a JSON array
    #[arg(long, action = ArgAction::SetTrue)]
    errors_json: bool,
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width = width
        .trim()
        .parse()
        .map_err(|e| format!("invalid width '{width}': {e}"))?;
    let height = height
        .trim()
        .parse()
        .map_err(|e| format!("invalid height '{height}': {e}"))?;
    Ok((width, height))
}

/// Load the document, returning its HTML and the URL it was loaded from
async fn load_source(
    source: &str,
    fetcher: &HttpFetcher,
    cache: CacheMode,
) -> Result<(String, String)> {
    if let Ok(url) = Url::parse(source)
        && matches!(url.scheme(), "http" | "https" | "file")
    {
        let html = fetcher
            .fetch_text(url.as_str(), cache)
            .await
            .with_context(|| format!("Failed to load {source}"))?;
        return Ok((html, url.to_string()));
    }

    let path = std::fs::canonicalize(source).with_context(|| format!("No such file: {source}"))?;
    let html = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let url = Url::from_file_path(&path)
        .map_err(|()| anyhow::anyhow!("Cannot build file URL for {}", path.display()))?;
    Ok((html, url.to_string()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let fetcher = HttpFetcher::new(FetchConfig::default());

    let (html, document_url) = load_source(&cli.source, &fetcher, cli.cache).await?;

    let mut builder = InlineOptions::builder()
        .cache(cli.cache)
        .inline_scripts(cli.inline_scripts);
    if let Some(base_url) = &cli.base_url {
        builder = builder.base_url(base_url.clone());
    }
    let options = builder.build();

    let doc = Document::parse(&html, Some(&document_url));
    let errors = inline_references(&doc, &fetcher, &options).await;

    let output = match cli.svg {
        Some((width, height)) => document_to_svg(
            &doc,
            SvgOptions {
                width,
                height,
                zoom: cli.zoom,
            },
        ),
        None => doc.to_html()?,
    };
    println!("{output}");

    if cli.errors_json {
        let json = serde_json::to_string_pretty(&errors).context("Failed to encode errors")?;
        eprintln!("{json}");
    } else {
        for error in &errors {
            log::warn!("{error}");
        }
    }

    log::info!("Done: {} resources could not be inlined", errors.len());
    Ok(())
}
