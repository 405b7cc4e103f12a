use crate::browser::{BrowsingContext, SessionManager, WebDriverSessions};
use crate::extract::{ReadabilityExtractor, extract_from_html};
use crate::fetch::{FetchReport, Fetcher};
use crate::validate::validate_url;
use sift_common::{ExtractionResult, PipelineConfig, Result, SiftError};
use sift_drivers::sift_browser::behavioral::Entropy;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Handle;
use tracing::{debug, info};

/// Fetch-and-extract pipeline.
///
/// Invocations are independent: each one opens its own browsing context,
/// and only the configuration is shared.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    sessions: Arc<dyn SessionManager>,
    extractor: ReadabilityExtractor,
    invocations: AtomicU64,
}

impl Pipeline {
    pub fn new(config: Arc<PipelineConfig>, sessions: Arc<dyn SessionManager>) -> Self {
        Self {
            config,
            sessions,
            extractor: ReadabilityExtractor::default(),
            invocations: AtomicU64::new(0),
        }
    }

    /// Pipeline driving Chromedriver at `config.webdriver_url`.
    pub fn with_webdriver(config: Arc<PipelineConfig>) -> Self {
        Self::new(config, Arc::new(WebDriverSessions))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Randomness for one invocation. Seeded pipelines derive a distinct,
    /// reproducible seed per invocation.
    fn next_entropy(&self) -> Entropy {
        let n = self.invocations.fetch_add(1, Ordering::Relaxed);
        Entropy::new(self.config.rng_seed.map(|seed| seed.wrapping_add(n)))
    }

    /// Fetch `url` through a fresh browsing context and extract its article.
    pub async fn extract(&self, url: &str) -> Result<ExtractionResult> {
        let target = validate_url(url)?;
        let report = self.fetch(&target).await?;
        let attempts = report.attempts.len();
        let html = report.into_result()?;

        let result = extract_from_html(&html, &self.extractor);
        info!(
            target: "extract",
            url = %target,
            attempts,
            readable = result.is_readable,
            length = result.length,
            "extract.completed"
        );
        Ok(result)
    }

    /// Run the retry loop against `url` and return the full attempt log.
    ///
    /// The browsing context is released before this returns, whatever the
    /// outcome.
    pub async fn fetch(&self, url: &url::Url) -> Result<FetchReport> {
        let mut entropy = self.next_entropy();
        let context = self.sessions.open_context(&self.config, &mut entropy).await?;
        let mut guard = ContextGuard::new(context);

        let report = match guard.context() {
            Some(context) => {
                Fetcher::new(&self.config)
                    .fetch(context, url, &mut entropy)
                    .await
            }
            None => return Err(SiftError::Browser("browsing context already released".into())),
        };
        guard.release().await;
        Ok(report)
    }
}

/// Owns a browsing context for the duration of one invocation.
///
/// [`release`](Self::release) closes it explicitly. If the guard is dropped
/// while still holding the context (for example because the invocation
/// future was cancelled), the close is spawned on the current runtime.
pub struct ContextGuard {
    inner: Option<Box<dyn BrowsingContext>>,
}

impl ContextGuard {
    pub fn new(context: Box<dyn BrowsingContext>) -> Self {
        Self {
            inner: Some(context),
        }
    }

    pub fn context(&mut self) -> Option<&mut (dyn BrowsingContext + 'static)> {
        self.inner.as_deref_mut()
    }

    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }

    /// Close the context, logging and swallowing close errors.
    pub async fn release(&mut self) {
        if let Some(mut context) = self.inner.take() {
            if let Err(err) = context.close().await {
                debug!(target: "browser.session", error = %err, "browser.session.close_failed");
            }
        }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let Some(mut context) = self.inner.take() else {
            return;
        };
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = context.close().await {
                        debug!(target: "browser.session", error = %err, "browser.session.close_failed");
                    }
                });
            }
            Err(_) => {
                debug!(target: "browser.session", "browser.session.leaked_without_runtime");
            }
        }
    }
}

/// One-shot extraction with a Chromedriver-backed pipeline.
pub async fn extract(url: &str, config: PipelineConfig) -> Result<ExtractionResult> {
    Pipeline::with_webdriver(Arc::new(config)).extract(url).await
}
