//! Test utilities and helper functions for the rasterize test suite

use kodegen_tools_rasterize::{CacheMode, FetchError, ResourceFetcher};
use std::cell::RefCell;
use std::collections::HashMap;

/// Canned response for one URL
#[derive(Debug, Clone)]
enum Fixture {
    Text(String),
    Binary(Vec<u8>),
}

/// Fetcher serving canned responses and recording every request
///
/// URLs without a fixture fail with a `FetchError`.
#[derive(Debug, Default)]
pub struct MockFetcher {
    fixtures: HashMap<String, Fixture>,
    requests: RefCell<Vec<String>>,
}

#[allow(dead_code)]
impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, url: &str, body: &str) -> Self {
        self.fixtures
            .insert(url.to_string(), Fixture::Text(body.to_string()));
        self
    }

    pub fn with_binary(mut self, url: &str, body: &[u8]) -> Self {
        self.fixtures
            .insert(url.to_string(), Fixture::Binary(body.to_vec()));
        self
    }

    /// Every requested URL, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn count_for(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|r| *r == url).count()
    }

    fn record(&self, url: &str) -> Option<Fixture> {
        self.requests.borrow_mut().push(url.to_string());
        self.fixtures.get(url).cloned()
    }
}

impl ResourceFetcher for MockFetcher {
    async fn fetch_text(&self, url: &str, _cache: CacheMode) -> Result<String, FetchError> {
        match self.record(url) {
            Some(Fixture::Text(text)) => Ok(text),
            Some(Fixture::Binary(bytes)) => {
                String::from_utf8(bytes).map_err(|_| FetchError::new(url, "not UTF-8"))
            }
            None => Err(FetchError::new(url, "404 Not Found")),
        }
    }

    async fn fetch_binary(&self, url: &str, _cache: CacheMode) -> Result<Vec<u8>, FetchError> {
        match self.record(url) {
            Some(Fixture::Binary(bytes)) => Ok(bytes),
            Some(Fixture::Text(text)) => Ok(text.into_bytes()),
            None => Err(FetchError::new(url, "404 Not Found")),
        }
    }
}

/// Creates a test HTML document with specified head and body content
#[allow(dead_code)]
pub fn create_test_html(head: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Test</title>
    {head}
</head>
<body>
    {body}
</body>
</html>"#
    )
}

/// Text content of every `<style>` element, in document order
#[allow(dead_code)]
pub fn style_texts(html: &str) -> Vec<String> {
    use kuchiki::traits::TendrilSink;

    let document = kuchiki::parse_html().one(html);
    document
        .select("style")
        .map(|styles| styles.map(|style| style.as_node().text_contents()).collect())
        .unwrap_or_default()
}

/// Starts a mock HTTP server for fetcher tests
#[allow(dead_code)]
pub async fn setup_mock_server() -> mockito::ServerGuard {
    mockito::Server::new_async().await
}

/// Creates a mock endpoint that returns `body` with the given content type
#[allow(dead_code)]
pub async fn create_body_mock(
    server: &mut mockito::ServerGuard,
    path: &str,
    content_type: &str,
    body: &[u8],
) -> mockito::Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", content_type)
        .with_body(body)
        .create_async()
        .await
}

/// Creates a mock endpoint that returns an error
#[allow(dead_code)]
pub async fn create_error_mock(
    server: &mut mockito::ServerGuard,
    path: &str,
    status: usize,
) -> mockito::Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_body("Error")
        .create_async()
        .await
}
