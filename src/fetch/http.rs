//! HTTP (and `file://`) implementation of [`ResourceFetcher`]
//!
//! ## Architecture
//!
//! Both trait methods funnel into one download core that handles:
//! - browser-like headers and a per-kind timeout,
//! - size limits enforced from `Content-Length` BEFORE downloading and
//!   again while streaming,
//! - cache busting according to the requested [`CacheMode`].
//!
//! ## Usage
//!
//! ```ignore
//! use kodegen_tools_rasterize::fetch::{HttpFetcher, ResourceFetcher};
//! use kodegen_tools_rasterize::config::{CacheMode, FetchConfig};
//!
//! let fetcher = HttpFetcher::new(FetchConfig::default());
//! let css = fetcher
//!     .fetch_text("https://example.com/style.css", CacheMode::Default)
//!     .await?;
//! ```

use anyhow::{Context, Result};
use futures::StreamExt;
use once_cell::sync::OnceCell;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::cache_buster::{augment_url, fresh_buster};
use super::{FetchError, ResourceFetcher};
use crate::config::{CacheMode, FetchConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DownloadKind {
    Text,
    Binary,
}

impl DownloadKind {
    fn accept(self) -> &'static str {
        match self {
            DownloadKind::Text => "text/css,application/javascript,text/*;q=0.9,*/*;q=0.1",
            DownloadKind::Binary => "image/avif,image/webp,image/apng,image/*,font/*,*/*;q=0.8",
        }
    }

    fn label(self) -> &'static str {
        match self {
            DownloadKind::Text => "Text resource",
            DownloadKind::Binary => "Binary resource",
        }
    }
}

/// Fetches resources over HTTP(S), or from disk for `file://` URLs
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
    repeated_buster: OnceCell<String>,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(FetchConfig::default())
    }
}

impl HttpFetcher {
    #[must_use]
    pub fn new(config: FetchConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Reuse an existing client (it is `Arc`-backed, cloning is cheap)
    #[must_use]
    pub fn with_client(client: Client, config: FetchConfig) -> Self {
        Self {
            client,
            config,
            repeated_buster: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn limits(&self, kind: DownloadKind) -> (Duration, usize) {
        match kind {
            DownloadKind::Text => (self.config.text_timeout, self.config.max_text_size),
            DownloadKind::Binary => (self.config.binary_timeout, self.config.max_binary_size),
        }
    }

    async fn download(&self, url: &str, cache: CacheMode, kind: DownloadKind) -> Result<Vec<u8>> {
        let parsed = Url::parse(url).with_context(|| format!("Cannot fetch relative URL '{url}'"))?;

        match parsed.scheme() {
            "http" | "https" => {
                let repeated = self.repeated_buster.get_or_init(fresh_buster);
                let request_url = augment_url(url, cache, repeated);
                self.download_http(&request_url, kind).await
            }
            "file" => self.read_file(&parsed, kind).await,
            scheme => Err(anyhow::anyhow!("Unsupported URL scheme '{scheme}'")),
        }
    }

    async fn download_http(&self, url: &str, kind: DownloadKind) -> Result<Vec<u8>> {
        let (timeout, max_size) = self.limits(kind);
        let label = kind.label();

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .header("User-Agent", &self.config.user_agent)
            .header("Accept", kind.accept())
            .send()
            .await
            .with_context(|| format!("Failed to download {url}"))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "{label} download failed with status: {}",
                response.status()
            ));
        }

        // Enforce the limit BEFORE downloading
        let expected_size = response.content_length().unwrap_or(0);
        if expected_size > max_size as u64 {
            return Err(anyhow::anyhow!(
                "{label} too large: {expected_size} bytes exceeds limit of {max_size} bytes"
            ));
        }

        let mut buffer = if expected_size > 0 {
            Vec::with_capacity(expected_size as usize)
        } else {
            Vec::new()
        };

        // Content-Length can lie, check again while streaming
        let mut stream = response.bytes_stream();
        let mut total_size = 0;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.context("Failed to read response chunk")?;

            let new_total = total_size + chunk.len();
            if new_total > max_size {
                return Err(anyhow::anyhow!(
                    "{label} download exceeded size limit during download: {new_total} bytes (max: {max_size})"
                ));
            }

            buffer.extend_from_slice(&chunk);
            total_size = new_total;
        }

        Ok(buffer)
    }

    async fn read_file(&self, url: &Url, kind: DownloadKind) -> Result<Vec<u8>> {
        let (_, max_size) = self.limits(kind);
        let path = url
            .to_file_path()
            .map_err(|()| anyhow::anyhow!("Invalid file URL: {url}"))?;

        let metadata = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        if metadata.len() > max_size as u64 {
            return Err(anyhow::anyhow!(
                "{} too large: {} bytes exceeds limit of {max_size} bytes",
                kind.label(),
                metadata.len()
            ));
        }

        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

impl ResourceFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str, cache: CacheMode) -> Result<String, FetchError> {
        let bytes = self
            .download(url, cache, DownloadKind::Text)
            .await
            .map_err(|e| FetchError::new(url, format!("{e:#}")))?;

        String::from_utf8(bytes)
            .map_err(|_| FetchError::new(url, "Text resource is not valid UTF-8"))
    }

    async fn fetch_binary(&self, url: &str, cache: CacheMode) -> Result<Vec<u8>, FetchError> {
        self.download(url, cache, DownloadKind::Binary)
            .await
            .map_err(|e| FetchError::new(url, format!("{e:#}")))
    }
}
