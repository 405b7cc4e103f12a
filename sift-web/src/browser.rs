use async_trait::async_trait;
use sift_common::{ClassifiedError, PipelineConfig, Result, SiftError};
use sift_drivers::sift_browser::{
    behavioral::Entropy, driver::SiftDriver, fingerprint::FingerprintProfile, page::SiftPage,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Opens one isolated browsing context per pipeline invocation.
#[async_trait]
pub trait SessionManager: Send + Sync {
    async fn open_context(
        &self,
        config: &PipelineConfig,
        entropy: &mut Entropy,
    ) -> Result<Box<dyn BrowsingContext>>;
}

/// A fresh browser profile. At most one page is open at a time.
#[async_trait]
pub trait BrowsingContext: Send {
    async fn open_page(&mut self) -> std::result::Result<Box<dyn PageSession>, ClassifiedError>;

    /// Tear the context down. Repeated calls are no-ops.
    async fn close(&mut self) -> anyhow::Result<()>;
}

/// One tab inside a [`BrowsingContext`].
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn apply_headers(
        &self,
        headers: &BTreeMap<String, String>,
    ) -> std::result::Result<(), ClassifiedError>;

    /// Navigate and wait for commit. `Ok(None)` means no response was received.
    async fn navigate(
        &mut self,
        url: &Url,
        timeout: Duration,
    ) -> std::result::Result<Option<u16>, ClassifiedError>;

    async fn is_dom_ready(&self) -> std::result::Result<bool, ClassifiedError>;

    async fn scroll_to(&self, fraction: f64) -> std::result::Result<(), ClassifiedError>;

    async fn content(&self) -> std::result::Result<String, ClassifiedError>;

    async fn close(&mut self) -> anyhow::Result<()>;
}

fn classified(err: anyhow::Error) -> ClassifiedError {
    ClassifiedError::from_message(format!("{err:#}"))
}

/// Sessions backed by a Chromedriver endpoint.
#[derive(Debug, Clone, Default)]
pub struct WebDriverSessions;

#[async_trait]
impl SessionManager for WebDriverSessions {
    async fn open_context(
        &self,
        config: &PipelineConfig,
        entropy: &mut Entropy,
    ) -> Result<Box<dyn BrowsingContext>> {
        let profile = FingerprintProfile::from_config(config, entropy);
        let driver = SiftDriver::launch(config, profile)
            .await
            .map_err(|e| SiftError::Browser(format!("{e:#}")))?;
        Ok(Box::new(WebDriverContext { driver }))
    }
}

struct WebDriverContext {
    driver: SiftDriver,
}

#[async_trait]
impl BrowsingContext for WebDriverContext {
    async fn open_page(&mut self) -> std::result::Result<Box<dyn PageSession>, ClassifiedError> {
        let page = self.driver.open_page().await.map_err(classified)?;
        Ok(Box::new(WebDriverPage { page }))
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.driver.close().await
    }
}

struct WebDriverPage {
    page: SiftPage,
}

#[async_trait]
impl PageSession for WebDriverPage {
    async fn apply_headers(
        &self,
        headers: &BTreeMap<String, String>,
    ) -> std::result::Result<(), ClassifiedError> {
        self.page.set_extra_headers(headers).await.map_err(classified)
    }

    async fn navigate(
        &mut self,
        url: &Url,
        timeout: Duration,
    ) -> std::result::Result<Option<u16>, ClassifiedError> {
        let status = self.page.goto(url, timeout).await.map_err(classified)?;
        debug!(target: "browser.session", url = %url, status = ?status, "browser.page.committed");
        Ok(status)
    }

    async fn is_dom_ready(&self) -> std::result::Result<bool, ClassifiedError> {
        self.page.is_dom_ready().await.map_err(classified)
    }

    async fn scroll_to(&self, fraction: f64) -> std::result::Result<(), ClassifiedError> {
        self.page.scroll_to(fraction).await.map_err(classified)
    }

    async fn content(&self) -> std::result::Result<String, ClassifiedError> {
        self.page.content().await.map_err(classified)
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.page.close().await
    }
}
