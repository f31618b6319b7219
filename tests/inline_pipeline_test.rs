//! End-to-end tests of the inlining pipeline against a recording mock fetcher

mod common;

use common::{create_test_html, style_texts, MockFetcher};
use kodegen_tools_rasterize::{
    inline_html, CacheBucket, InlineOptions, InliningError, ResourceType,
};

const PAGE_URL: &str = "http://example.com/index.html";

fn error(resource_type: ResourceType, url: &str) -> InliningError {
    InliningError::unable_to_load(resource_type, url)
}

#[tokio::test]
async fn test_document_without_references_is_untouched() {
    let fetcher = MockFetcher::new();
    let html = create_test_html("", "<p>Hello <b>world</b></p>");

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert!(!result.has_failures());
    assert_eq!(fetcher.request_count(), 0);
    assert!(result.html.contains("<p>Hello <b>world</b></p>"));
}

#[tokio::test]
async fn test_data_uri_image_is_never_fetched() {
    let fetcher = MockFetcher::new();
    let html = create_test_html("", r#"<img src="data:image/png;base64,AAAA">"#);

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert_eq!(fetcher.request_count(), 0);
    assert!(result.errors.is_empty());
    assert!(result.html.contains(r#"src="data:image/png;base64,AAAA""#));
}

#[tokio::test]
async fn test_images_inlined_and_failures_reported() {
    let fetcher = MockFetcher::new().with_binary("http://example.com/img/a.png", b"X");
    let html = create_test_html(
        "",
        r#"<img src="img/a.png"><img alt="no source"><input type="image" src="missing.png">"#,
    );

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert!(result.html.contains(r#"<img src="data:image/png;base64,WA==">"#));
    assert!(result.html.contains(r#"src="missing.png""#));
    assert_eq!(
        result.errors,
        vec![error(ResourceType::Image, "http://example.com/missing.png")]
    );
    assert_eq!(
        result.errors[0].msg,
        "Unable to load image http://example.com/missing.png"
    );
}

#[tokio::test]
async fn test_link_with_background_end_to_end() {
    let fetcher = MockFetcher::new()
        .with_text(
            "http://example.com/style.css",
            "div { background-image: url(bg.png); }",
        )
        .with_binary("http://example.com/bg.png", b"X");
    let html = create_test_html(r#"<link rel="stylesheet" href="style.css">"#, "<div></div>");

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert!(result.errors.is_empty());
    assert!(!result.html.contains("<link"));
    assert_eq!(
        style_texts(&result.html),
        vec![r#"div{background-image:url("data:image/png;base64,WA==")}"#.to_string()]
    );
}

#[tokio::test]
async fn test_sheet_resources_resolve_against_sheet_url() {
    let fetcher = MockFetcher::new()
        .with_text(
            "http://example.com/css/site.css",
            "p { background: url(../img/p.png) no-repeat }",
        )
        .with_binary("http://example.com/img/p.png", b"X");
    let html = create_test_html(r#"<link rel="stylesheet" href="css/site.css">"#, "");

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert!(result.errors.is_empty());
    assert_eq!(
        style_texts(&result.html),
        vec![r#"p{background:url("data:image/png;base64,WA==") no-repeat}"#.to_string()]
    );
}

#[tokio::test]
async fn test_failed_sheet_resources_keep_sheet_relative_urls() {
    let fetcher = MockFetcher::new().with_text(
        "http://example.com/css/site.css",
        "div{background-image:url(bg.png)}\n@import 'missing.css';\n@font-face{font-family:F;src:url(f.woff)}",
    );
    let html = create_test_html(r#"<link rel="stylesheet" href="css/site.css">"#, "");

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert_eq!(
        result.errors,
        vec![
            error(ResourceType::Stylesheet, "http://example.com/css/missing.css"),
            error(ResourceType::BackgroundImage, "http://example.com/css/bg.png"),
            error(ResourceType::FontFace, "http://example.com/css/f.woff"),
        ]
    );
    let styles = style_texts(&result.html);
    assert_eq!(styles.len(), 1);
    assert!(styles[0].contains(r#"url("http://example.com/css/bg.png")"#));
    assert!(styles[0].contains(r#"@import url("http://example.com/css/missing.css");"#));
    assert!(styles[0].contains(r#"url("http://example.com/css/f.woff")"#));
    assert!(!styles[0].contains("url(bg.png)"));
}

#[tokio::test]
async fn test_relative_sheet_without_document_url_stays_document_relative() {
    let fetcher = MockFetcher::new().with_text("css/site.css", "p{background:url(bg.png)}");
    let html = create_test_html(r#"<link rel="stylesheet" href="css/site.css">"#, "");

    let result = inline_html(&html, None, &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert_eq!(
        result.errors,
        vec![error(ResourceType::BackgroundImage, "css/bg.png")]
    );
    assert_eq!(
        style_texts(&result.html),
        vec![r#"p{background:url("css/bg.png")}"#.to_string()]
    );
    assert_eq!(fetcher.count_for("css/bg.png"), 1);
}

#[tokio::test]
async fn test_duplicate_links_fetched_once() {
    let fetcher = MockFetcher::new().with_text("http://example.com/a.css", "a { color: red }");
    let html = create_test_html(
        r#"<link rel="stylesheet" href="a.css"><link rel="stylesheet" href="./a.css">"#,
        "",
    );

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert!(result.errors.is_empty());
    assert_eq!(fetcher.count_for("http://example.com/a.css"), 1);
    assert!(!result.html.contains("<link"));
    assert_eq!(
        style_texts(&result.html),
        vec!["a { color: red }".to_string(), "a { color: red }".to_string()]
    );
}

#[tokio::test]
async fn test_failed_link_is_kept_and_reported() {
    let fetcher = MockFetcher::new();
    let html = create_test_html(r#"<link rel="stylesheet" href="gone.css">"#, "");

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert!(result.html.contains(r#"href="gone.css""#));
    assert_eq!(
        result.errors,
        vec![error(ResourceType::Stylesheet, "http://example.com/gone.css")]
    );
}

#[tokio::test]
async fn test_empty_sheet_removes_link_without_style() {
    let fetcher = MockFetcher::new().with_text("http://example.com/empty.css", "/* nothing */\n");
    let html = create_test_html(r#"<link rel="stylesheet" href="empty.css">"#, "");

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert!(!result.html.contains("<link"));
    assert!(style_texts(&result.html).is_empty());
}

#[tokio::test]
async fn test_non_css_links_are_ignored() {
    let fetcher = MockFetcher::new();
    let html = create_test_html(
        r#"<link rel="icon" href="favicon.ico"><link rel="stylesheet" type="text/less" href="a.less">"#,
        "",
    );

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert_eq!(fetcher.request_count(), 0);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_duplicate_imports_fetched_once() {
    let fetcher = MockFetcher::new().with_text("http://example.com/a.css", "a { color: red }");
    let html = create_test_html(
        r#"<style>@import "a.css"; @import url('a.css'); b { color: blue }</style>"#,
        "",
    );

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert_eq!(fetcher.count_for("http://example.com/a.css"), 1);
    assert_eq!(
        style_texts(&result.html),
        vec!["a { color: red }\nb { color: blue }".to_string()]
    );
}

#[tokio::test]
async fn test_cyclic_imports_fetch_each_sheet_once() {
    let fetcher = MockFetcher::new()
        .with_text("http://example.com/a.css", "@import 'b.css';\na { x: 1 }")
        .with_text("http://example.com/b.css", "@import 'a.css';\nb { x: 2 }");
    let html = create_test_html(r#"<link rel="stylesheet" href="a.css">"#, "");

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert!(result.errors.is_empty());
    assert_eq!(fetcher.count_for("http://example.com/a.css"), 1);
    assert_eq!(fetcher.count_for("http://example.com/b.css"), 1);
    assert_eq!(
        style_texts(&result.html),
        vec!["b { x: 2 }\na { x: 1 }".to_string()]
    );
}

#[tokio::test]
async fn test_one_of_two_background_layers_failing() {
    let fetcher = MockFetcher::new().with_binary("http://example.com/ok.png", b"X");
    let html = create_test_html(
        "<style>div { background-image: url(ok.png), url(broken.png) }</style>",
        "",
    );

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert_eq!(
        result.errors,
        vec![error(ResourceType::BackgroundImage, "broken.png")]
    );
    assert_eq!(
        style_texts(&result.html),
        vec![
            r#"div{background-image:url("data:image/png;base64,WA=="), url("broken.png")}"#
                .to_string()
        ]
    );
}

#[tokio::test]
async fn test_failing_font_face_reports_url_as_written() {
    let fetcher = MockFetcher::new();
    let css = r#"@font-face { font-family: "test"; src: url(f.woff); }"#;
    let html = format!("<html><head><style>{css}</style></head><body></body></html>");

    let result = inline_html(&html, None, &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].resource_type, ResourceType::FontFace);
    assert_eq!(result.errors[0].url, "f.woff");
    assert_eq!(result.errors[0].msg, "Unable to load font-face f.woff");
    assert_eq!(style_texts(&result.html), vec![css.to_string()]);
}

#[tokio::test]
async fn test_style_without_changes_keeps_exact_text() {
    let fetcher = MockFetcher::new();
    let css = "p  {  color : red  } /* keep me */";
    let html = create_test_html(&format!("<style>{css}</style>"), "");

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert_eq!(style_texts(&result.html), vec![css.to_string()]);
}

#[tokio::test]
async fn test_link_generated_styles_are_not_processed_twice() {
    let fetcher = MockFetcher::new().with_text(
        "http://example.com/s.css",
        "a { background: url(missing.png) }",
    );
    let html = create_test_html(r#"<link rel="stylesheet" href="s.css">"#, "");

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert_eq!(
        result.errors,
        vec![error(
            ResourceType::BackgroundImage,
            "http://example.com/missing.png"
        )]
    );
    assert_eq!(fetcher.count_for("http://example.com/missing.png"), 1);
}

#[tokio::test]
async fn test_errors_in_stage_order() {
    let fetcher = MockFetcher::new();
    let html = create_test_html(
        r#"<link rel="stylesheet" href="gone.css"><style>a { background: url(bg.png) }</style>"#,
        r#"<img src="pic.png">"#,
    );

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    let types: Vec<ResourceType> = result.errors.iter().map(|e| e.resource_type).collect();
    assert_eq!(
        types,
        vec![
            ResourceType::Image,
            ResourceType::Stylesheet,
            ResourceType::BackgroundImage
        ]
    );
}

#[tokio::test]
async fn test_base_url_option_overrides_document() {
    let fetcher = MockFetcher::new().with_binary("http://cdn.example.org/assets/a.png", b"X");
    let html = create_test_html(r#"<base href="http://ignored.example/">"#, r#"<img src="a.png">"#);
    let options = InlineOptions::builder()
        .base_url("http://cdn.example.org/assets/")
        .build();

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &options)
        .await
        .unwrap();

    assert!(result.errors.is_empty());
    assert_eq!(
        fetcher.requests(),
        vec!["http://cdn.example.org/assets/a.png".to_string()]
    );
}

#[tokio::test]
async fn test_base_element_is_honored() {
    let fetcher = MockFetcher::new().with_binary("http://example.com/static/a.png", b"X");
    let html = create_test_html(r#"<base href="static/">"#, r#"<img src="a.png">"#);

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();

    assert!(result.errors.is_empty());
    assert!(result.html.contains("data:image/png;base64,WA=="));
}

#[tokio::test]
async fn test_scripts_inlined_only_when_enabled() {
    let script_body = r#"var s = "</script>";"#;
    let html = create_test_html(
        r#"<script type="text/x-test" src="app.js"></script>"#,
        "",
    );

    let fetcher = MockFetcher::new().with_text("http://example.com/app.js", script_body);
    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &InlineOptions::default())
        .await
        .unwrap();
    assert_eq!(fetcher.request_count(), 0);
    assert!(result.html.contains(r#"src="app.js""#));

    let fetcher = MockFetcher::new().with_text("http://example.com/app.js", script_body);
    let options = InlineOptions::builder().inline_scripts(true).build();
    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &options)
        .await
        .unwrap();
    assert!(result.errors.is_empty());
    assert!(
        result
            .html
            .contains(r#"<script type="text/x-test">var s = "<\/script>";</script>"#)
    );
}

#[tokio::test]
async fn test_failed_script_is_kept_and_reported() {
    let fetcher = MockFetcher::new();
    let html = create_test_html(r#"<script src="app.js"></script>"#, "");
    let options = InlineOptions::builder().inline_scripts(true).build();

    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &options)
        .await
        .unwrap();

    assert!(result.html.contains(r#"<script src="app.js"></script>"#));
    assert_eq!(
        result.errors,
        vec![error(ResourceType::Script, "http://example.com/app.js")]
    );
    assert_eq!(
        result.errors[0].msg,
        "Unable to load script http://example.com/app.js"
    );
}

#[tokio::test]
async fn test_cache_bucket_replays_without_fetching() {
    let html = create_test_html(
        r#"<link rel="stylesheet" href="s.css"><style>p { background: url(p.png) }</style>"#,
        r#"<img src="a.png">"#,
    );
    let bucket = CacheBucket::new();
    let options = InlineOptions::builder().cache_bucket(bucket.clone()).build();

    let first_fetcher = MockFetcher::new()
        .with_text("http://example.com/s.css", "div { color: red }")
        .with_binary("http://example.com/a.png", b"A")
        .with_binary("http://example.com/p.png", b"P");
    let first = inline_html(&html, Some(PAGE_URL), &first_fetcher, &options)
        .await
        .unwrap();
    assert!(first_fetcher.request_count() > 0);
    assert_eq!(bucket.len(), 1);

    let second_fetcher = MockFetcher::new();
    let second = inline_html(&html, Some(PAGE_URL), &second_fetcher, &options)
        .await
        .unwrap();

    assert_eq!(second_fetcher.request_count(), 0);
    assert_eq!(second.html, first.html);
    assert_eq!(second.errors, first.errors);
}

#[tokio::test]
async fn test_cache_bucket_unused_without_base_url() {
    let bucket = CacheBucket::new();
    let options = InlineOptions::builder().cache_bucket(bucket.clone()).build();
    let fetcher = MockFetcher::new();

    inline_html(r#"<img src="a.png">"#, None, &fetcher, &options)
        .await
        .unwrap();

    assert!(bucket.is_empty());
}

#[tokio::test]
async fn test_cache_bucket_skips_runs_with_failures() {
    let html = create_test_html("", r#"<img src="a.png">"#);
    let bucket = CacheBucket::new();
    let options = InlineOptions::builder().cache_bucket(bucket.clone()).build();

    let failing = MockFetcher::new();
    let first = inline_html(&html, Some(PAGE_URL), &failing, &options)
        .await
        .unwrap();
    assert_eq!(first.errors.len(), 1);
    assert!(bucket.is_empty());

    let working = MockFetcher::new().with_binary("http://example.com/a.png", b"X");
    let second = inline_html(&html, Some(PAGE_URL), &working, &options)
        .await
        .unwrap();

    assert_eq!(working.count_for("http://example.com/a.png"), 1);
    assert!(second.errors.is_empty());
    assert!(second.html.contains("data:image/png;base64,WA=="));
    assert_eq!(bucket.len(), 1);
}

#[tokio::test]
async fn test_cache_bucket_separates_script_settings() {
    let html = create_test_html(r#"<script src="app.js"></script>"#, "");
    let bucket = CacheBucket::new();

    let without_scripts = InlineOptions::builder().cache_bucket(bucket.clone()).build();
    let fetcher = MockFetcher::new().with_text("http://example.com/app.js", "run()");
    inline_html(&html, Some(PAGE_URL), &fetcher, &without_scripts)
        .await
        .unwrap();
    assert_eq!(fetcher.request_count(), 0);

    let with_scripts = InlineOptions::builder()
        .cache_bucket(bucket.clone())
        .inline_scripts(true)
        .build();
    let result = inline_html(&html, Some(PAGE_URL), &fetcher, &with_scripts)
        .await
        .unwrap();

    assert_eq!(fetcher.count_for("http://example.com/app.js"), 1);
    assert!(result.html.contains("<script>run()</script>"));
    assert_eq!(bucket.len(), 2);
}
