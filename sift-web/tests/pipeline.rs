mod common;

use common::{ARTICLE_PAGE, Event, LINKS_PAGE, ScriptedSessions, Step, seeded_config};
use scraper::Selector;
use sift_common::{EXCERPT_CHARS, SiftError};
use sift_web::Pipeline;
use sift_web::normalize::normalize_text;
use sift_web::sanitize::sanitize;
use std::sync::Arc;
use std::time::Duration;

fn pipeline_with(steps: impl IntoIterator<Item = Step>) -> (Pipeline, common::EventLog) {
    let sessions = ScriptedSessions::new(steps);
    let log = sessions.log.clone();
    (Pipeline::new(Arc::new(seeded_config()), Arc::new(sessions)), log)
}

#[tokio::test(start_paused = true)]
async fn non_web_schemes_are_rejected_before_any_browser_work() {
    let (pipeline, log) = pipeline_with([Step::ok(ARTICLE_PAGE)]);
    for raw in ["ftp://example.com", "not a url", "mailto:someone@example.com"] {
        let err = pipeline.extract(raw).await.unwrap_err();
        assert!(matches!(err, SiftError::InvalidUrl(_)), "{raw}: {err:?}");
    }
    assert!(log.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn article_page_is_extracted_as_readable() {
    let (pipeline, log) = pipeline_with([Step::ok(ARTICLE_PAGE)]);

    let result = pipeline.extract("https://notes.example.com/ownership").await.unwrap();

    assert!(result.is_readable);
    assert_eq!(result.title, "Understanding Ownership");
    assert_eq!(result.byline.as_deref(), Some("Ferris Crab"));
    assert_eq!(result.site_name.as_deref(), Some("Rust Notes"));
    assert!(result.text_content.contains("Ownership is a set of rules"));
    assert!(result.text_content.contains("let s = String::from(\"hello\");\nlet t = s;"));
    assert!(!result.text_content.contains("Archive"));
    assert!(!result.text_content.contains("cookies"));
    assert!(!result.content.contains("trackPageView"));
    assert!(result.excerpt.starts_with("Ownership is a set of rules"));
    assert!(result.excerpt.chars().count() <= EXCERPT_CHARS);
    assert_eq!(result.length, result.text_content.chars().count());
    assert_eq!(log.count(&Event::CloseContext), 1);
}

#[tokio::test(start_paused = true)]
async fn link_directory_falls_back_to_the_whole_body() {
    let (pipeline, _log) = pipeline_with([Step::ok(LINKS_PAGE)]);

    let result = pipeline.extract("https://example.com/links").await.unwrap();

    let sanitized = sanitize(LINKS_PAGE);
    let body_selector = Selector::parse("body").unwrap();
    let body = sanitized.document.select(&body_selector).next().unwrap();
    let raw_text: String = body.text().collect();
    let raw_excerpt: String = raw_text.chars().take(EXCERPT_CHARS).collect();

    assert!(!result.is_readable);
    assert_eq!(result.title, "Link Directory");
    assert_eq!(result.content, body.inner_html());
    assert_eq!(result.excerpt, normalize_text(Some(&raw_excerpt)));
    assert_eq!(result.text_content, normalize_text(Some(&raw_text)));
    assert_eq!(result.byline, None);
    assert_eq!(result.site_name, None);
    assert_eq!(result.length, result.text_content.chars().count());
}

#[tokio::test(start_paused = true)]
async fn driver_launch_failure_surfaces_as_browser_error() {
    let sessions = ScriptedSessions::unreachable_driver("connection refused: localhost:9515");
    let pipeline = Pipeline::new(Arc::new(seeded_config()), Arc::new(sessions));

    let err = pipeline.extract("https://example.com").await.unwrap_err();
    assert!(matches!(err, SiftError::Browser(ref m) if m.contains("9515")), "{err:?}");
}

#[tokio::test(start_paused = true)]
async fn cancelled_invocation_still_closes_its_context() {
    let (pipeline, log) = pipeline_with([Step::ok(ARTICLE_PAGE)]);

    // The pre-navigation jitter is at least 500ms, so this times out mid-attempt.
    let outcome = tokio::time::timeout(
        Duration::from_millis(100),
        pipeline.extract("https://example.com/slow"),
    )
    .await;
    assert!(outcome.is_err());

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(log.count(&Event::OpenContext), 1);
    assert_eq!(log.count(&Event::CloseContext), 1);
}

#[tokio::test(start_paused = true)]
async fn seeded_pipelines_are_reproducible() {
    let run = || async {
        let (pipeline, _log) = pipeline_with([Step::ok(ARTICLE_PAGE)]);
        let started = tokio::time::Instant::now();
        pipeline.extract("https://example.com/a").await.unwrap();
        started.elapsed()
    };
    assert_eq!(run().await, run().await);
}
