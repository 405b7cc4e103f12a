use crate::sift_browser::{
    behavioral::BehavioralEngine,
    cdp::CdpCommand,
    fingerprint::FingerprintProfile,
    stealth::StealthScripts,
    wait::{remaining, wait_until},
};
use anyhow::{anyhow, bail, Context, Result};
use fantoccini::wd::WindowHandle;
use fantoccini::Client;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};
use url::Url;

const COMMIT_POLL: Duration = Duration::from_millis(100);

/// URL of the document currently committed in the tab.
const COMMITTED_HREF_SCRIPT: &str = "return location.href;";

/// Inspects the committed document from inside the page. Chromedriver reports
/// the requested URL for Chrome's network error page, so the error has to be
/// read from the page itself.
const NAVIGATION_STATE_SCRIPT: &str = r#"
    let error = null;
    if (location.href.startsWith('chrome-error://')) {
        try {
            if (window.loadTimeData && loadTimeData.data_ && loadTimeData.data_.errorCode) {
                error = String(loadTimeData.data_.errorCode);
            }
        } catch (e) {}
        if (!error) {
            const el = document.querySelector('.error-code');
            error = el ? el.textContent.trim() : '';
        }
    }
    const entries = performance.getEntriesByType('navigation');
    const status = entries && entries.length > 0 ? entries[0].responseStatus : null;
    return { error: error, status: status || null };
"#;

/// One browser tab owned by a [`SiftDriver`](super::driver::SiftDriver).
pub struct SiftPage {
    client: Client,
    handle: WindowHandle,
    origin: WindowHandle,
    profile: FingerprintProfile,
    behavioral_engine: BehavioralEngine,
    closed: bool,
}

impl SiftPage {
    pub(crate) fn new(
        client: Client,
        handle: WindowHandle,
        origin: WindowHandle,
        profile: FingerprintProfile,
        behavioral_engine: BehavioralEngine,
    ) -> Self {
        Self {
            client,
            handle,
            origin,
            profile,
            behavioral_engine,
            closed: false,
        }
    }

    pub fn behavioral_engine(&self) -> &BehavioralEngine {
        &self.behavioral_engine
    }

    /// Send `headers` with every request this tab makes.
    pub async fn set_extra_headers(&self, headers: &BTreeMap<String, String>) -> Result<()> {
        if headers.is_empty() {
            return Ok(());
        }
        self.client
            .issue_cmd(CdpCommand::enable_network())
            .await
            .context("enabling network domain")?;
        self.client
            .issue_cmd(CdpCommand::set_extra_headers(headers))
            .await
            .context("setting extra HTTP headers")?;
        Ok(())
    }

    /// Navigate to `url` and wait until the new document has committed.
    ///
    /// Returns the HTTP status of the main response, or `None` when the
    /// document committed without one. Network-level failures surface as
    /// `net::<CODE> at <url>` errors.
    pub async fn goto(&mut self, url: &Url, budget: Duration) -> Result<Option<u16>> {
        let started = Instant::now();
        let budget_ms = budget.as_millis();

        timeout(budget, self.client.goto(url.as_str()))
            .await
            .map_err(|_| anyhow!("Navigation timeout of {budget_ms} ms exceeded"))?
            .map_err(|e| anyhow!("{e}"))?;

        let client = &self.client;
        let committed = wait_until(remaining(started, budget), COMMIT_POLL, move || async move {
            let href = client.execute(COMMITTED_HREF_SCRIPT, vec![]).await?;
            Ok::<_, fantoccini::error::CmdError>(
                href.as_str().is_some_and(|h| h != "about:blank"),
            )
        })
        .await;
        if !committed.is_ready() {
            bail!("Navigation timeout of {budget_ms} ms exceeded");
        }

        let state = self.client.execute(NAVIGATION_STATE_SCRIPT, vec![]).await?;
        let status = interpret_navigation_state(&state, url)?;

        if let Err(err) = self.apply_stealth().await {
            debug!(target: "browser.session", error = %err, "browser.stealth.skipped");
        }

        Ok(status)
    }

    /// Status of the main document response as reported by the Navigation
    /// Timing API. `None` when the document has no recorded response.
    pub async fn response_status(&self) -> Result<Option<u16>> {
        let state = self.client.execute(NAVIGATION_STATE_SCRIPT, vec![]).await?;
        Ok(reported_status(&state))
    }

    /// Whether `document.readyState` has reached `interactive` or `complete`.
    pub async fn is_dom_ready(&self) -> Result<bool> {
        let state = self
            .client
            .execute("return document.readyState;", vec![])
            .await?;
        Ok(matches!(state.as_str(), Some("interactive" | "complete")))
    }

    /// Scroll to `fraction` of the document height.
    pub async fn scroll_to(&self, fraction: f64) -> Result<()> {
        self.client
            .execute(BehavioralEngine::scroll_script(), vec![json!(fraction)])
            .await?;
        Ok(())
    }

    /// Full HTML of the current document.
    pub async fn content(&self) -> Result<String> {
        self.client.source().await.map_err(anyhow::Error::from)
    }

    async fn apply_stealth(&self) -> Result<()> {
        self.client
            .execute(StealthScripts::core_evasions(), vec![])
            .await?;
        self.client
            .execute(&StealthScripts::profile_overrides(&self.profile), Vec::<Value>::new())
            .await?;
        Ok(())
    }

    /// Close this tab and return focus to the session's initial window.
    /// Calling it again is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.client.switch_to_window(self.handle.clone()).await?;
        self.client.close_window().await?;
        if let Err(err) = self.client.switch_to_window(self.origin.clone()).await {
            warn!(target: "browser.session", error = %err, "browser.page.refocus_failed");
        }
        Ok(())
    }
}

/// Map the in-page navigation state to a status, or to a `net::<CODE> at <url>`
/// error when the tab shows Chrome's network error page.
pub fn interpret_navigation_state(state: &Value, url: &Url) -> Result<Option<u16>> {
    if let Some(error) = state.get("error").and_then(Value::as_str) {
        let code = error.trim().trim_start_matches("net::");
        let code = if code.is_empty() { "ERR_FAILED" } else { code };
        bail!("net::{} at {}", code.to_ascii_uppercase(), url);
    }
    Ok(reported_status(state))
}

/// Zero or a missing status means no response was recorded.
fn reported_status(state: &Value) -> Option<u16> {
    state
        .get("status")
        .and_then(Value::as_u64)
        .filter(|&s| s > 0)
        .and_then(|s| u16::try_from(s).ok())
}
