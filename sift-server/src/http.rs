//! JSON endpoint exposing the extraction pipeline.
//!
//! A single route, `POST /extract`, takes `{"url": "..."}` and answers with the
//! full [`ExtractionResult`](sift_common::ExtractionResult).
use crate::extractor::Extractor;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use sift_config::ServerConfig;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<dyn Extractor>,
    pub request_timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/extract", post(extract))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /extract`.
///
/// The body is parsed leniently: anything that does not yield a non-empty
/// `url` string is answered with 400.
pub async fn extract(State(state): State<AppState>, body: Bytes) -> Response {
    let request: ExtractRequest = serde_json::from_slice(&body).unwrap_or_default();
    let Some(url) = request.url.filter(|u| !u.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "URL is required");
    };

    match tokio::time::timeout(state.request_timeout, state.extractor.extract(&url)).await {
        Ok(Ok(result)) => {
            info!(target: "http", url = %url, readable = result.is_readable, "http.extract.ok");
            (StatusCode::OK, Json(result)).into_response()
        }
        Ok(Err(err)) => {
            error!(target: "http", url = %url, error = %err, "http.extract.failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to extract content")
        }
        Err(_) => {
            warn!(
                target: "http",
                url = %url,
                timeout_secs = state.request_timeout.as_secs(),
                "http.extract.timed_out"
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to extract content")
        }
    }
}

pub struct HttpServer {
    config: ServerConfig,
    extractor: Arc<dyn Extractor>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, extractor: Arc<dyn Extractor>) -> Self {
        Self { config, extractor }
    }

    /// Serve until `shutdown` resolves.
    pub async fn run(&self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .context("Invalid HTTP listen address")?;

        let app = router(AppState {
            extractor: self.extractor.clone(),
            request_timeout: Duration::from_secs(self.config.request_timeout_secs),
        });

        let listener = TcpListener::bind(&addr)
            .await
            .context("Failed to bind HTTP server")?;
        info!(target: "http", %addr, "http.listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server error")?;

        info!(target: "http", "http.stopped");
        Ok(())
    }
}
