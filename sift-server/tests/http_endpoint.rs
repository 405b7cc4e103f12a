use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use sift_common::{ClassifiedError, ExtractionResult, SiftError};
use sift_server::{AppState, Extractor, router};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::ServiceExt;

#[derive(Default)]
struct FakeExtractor {
    calls: AtomicUsize,
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn extract(&self, url: &str) -> sift_common::Result<ExtractionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.contains("slow") {
            tokio::time::sleep(Duration::from_secs(600)).await;
        }
        if url.contains("exhausted") {
            return Err(SiftError::ExhaustedRetries {
                attempts: 3,
                last: ClassifiedError::from_message("HTTP 503").at_attempt(2),
            });
        }
        Ok(ExtractionResult {
            title: "Fixture".into(),
            content: "<div><p>Body text</p></div>".into(),
            text_content: "Body text".into(),
            length: 9,
            excerpt: "Body text".into(),
            byline: None,
            site_name: None,
            is_readable: false,
        })
    }
}

fn app(extractor: Arc<FakeExtractor>) -> axum::Router {
    router(AppState {
        extractor,
        request_timeout: Duration::from_secs(5),
    })
}

async fn post(app: axum::Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/extract")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn missing_or_empty_url_is_a_bad_request() {
    let extractor = Arc::new(FakeExtractor::default());
    for body in ["{}", r#"{"url": ""}"#, r#"{"url": null}"#, "not json"] {
        let (status, json) = post(app(extractor.clone()), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(json, json!({"error": "URL is required"}));
    }
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn success_returns_the_full_result_in_camel_case() {
    let (status, json) = post(
        app(Arc::new(FakeExtractor::default())),
        r#"{"url": "https://example.com/links"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Fixture");
    assert_eq!(json["textContent"], "Body text");
    assert_eq!(json["isReadable"], false);
    assert_eq!(json["length"], 9);
    assert!(json.get("byline").is_none());
    assert!(json.get("siteName").is_none());
}

#[tokio::test]
async fn pipeline_failure_is_a_generic_server_error() {
    let (status, json) = post(
        app(Arc::new(FakeExtractor::default())),
        r#"{"url": "https://exhausted.example.com"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({"error": "Failed to extract content"}));
}

#[tokio::test(start_paused = true)]
async fn request_deadline_maps_to_server_error() {
    let (status, json) = post(
        app(Arc::new(FakeExtractor::default())),
        r#"{"url": "https://slow.example.com"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to extract content");
}

#[tokio::test]
async fn other_routes_are_not_served() {
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app(Arc::new(FakeExtractor::default()))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
