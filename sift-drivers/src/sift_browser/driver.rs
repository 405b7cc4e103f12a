use crate::sift_browser::{
    behavioral::BehavioralEngine,
    fingerprint::FingerprintProfile,
    page::SiftPage,
    stealth::build_stealth_arguments,
};
use anyhow::{Context, Result};
use fantoccini::wd::{Capabilities, WindowHandle};
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use sift_common::PipelineConfig;
use tracing::debug;

/// One isolated Chromedriver session.
///
/// Every session starts from a fresh browser profile, so cookies and storage
/// never leak between invocations. Pages are opened as new tabs; the initial
/// tab is kept so that closing a page never ends the session.
pub struct SiftDriver {
    client: Client,
    origin: WindowHandle,
    profile: FingerprintProfile,
    behavioral_engine: BehavioralEngine,
    closed: bool,
}

impl SiftDriver {
    /// Connect to `config.webdriver_url` and start a session presenting `profile`.
    pub async fn launch(config: &PipelineConfig, profile: FingerprintProfile) -> Result<Self> {
        let caps = session_capabilities(&profile, config.headless);

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await
            .with_context(|| format!("connecting to WebDriver at {}", config.webdriver_url))?;

        let origin = client
            .window()
            .await
            .context("reading initial window handle")?;

        debug!(
            target: "browser.session",
            webdriver = %config.webdriver_url,
            device_scale_factor = profile.device_scale_factor,
            "browser.session.launched"
        );

        Ok(Self {
            client,
            origin,
            profile,
            behavioral_engine: BehavioralEngine::new(),
            closed: false,
        })
    }

    pub fn profile(&self) -> &FingerprintProfile {
        &self.profile
    }

    /// Open a new tab and make it the current browsing target.
    pub async fn open_page(&mut self) -> Result<SiftPage> {
        anyhow::ensure!(!self.closed, "browser session already closed");

        let tab = self
            .client
            .new_window(true)
            .await
            .context("opening new tab")?;
        self.client
            .switch_to_window(tab.handle.clone())
            .await
            .context("switching to new tab")?;

        Ok(SiftPage::new(
            self.client.clone(),
            tab.handle,
            self.origin.clone(),
            self.profile.clone(),
            self.behavioral_engine.clone(),
        ))
    }

    /// End the WebDriver session. Calling it again is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.client
            .clone()
            .close()
            .await
            .context("closing WebDriver session")?;
        debug!(target: "browser.session", "browser.session.closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Capabilities requesting Chrome with the profile's stealth arguments.
///
/// The `none` page-load strategy makes `goto` return as soon as navigation
/// starts; readiness is then awaited explicitly by the page.
pub fn session_capabilities(profile: &FingerprintProfile, headless: bool) -> Capabilities {
    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("pageLoadStrategy".to_string(), json!("none"));
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": build_stealth_arguments(profile, headless),
            "excludeSwitches": ["enable-automation"],
        }),
    );
    caps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sift_browser::behavioral::Entropy;

    #[test]
    fn capabilities_request_commit_strategy_and_stealth_args() {
        let cfg = PipelineConfig::default();
        let profile = FingerprintProfile::from_config(&cfg, &mut Entropy::seeded(5));
        let caps = session_capabilities(&profile, true);

        assert_eq!(caps["pageLoadStrategy"], "none");
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        let expected = format!("--force-device-scale-factor={}", profile.device_scale_factor);
        assert!(args.iter().any(|a| a == &json!(expected)));
        assert!(args.iter().any(|a| *a == "--headless=new"));
        assert!(args.iter().any(|a| *a == "--window-size=1920,1080"));
    }

    #[tokio::test]
    #[ignore = "requires a running chromedriver on localhost:9515"]
    async fn opens_and_closes_a_tab() {
        let cfg = PipelineConfig::default();
        let profile = FingerprintProfile::from_config(&cfg, &mut Entropy::seeded(1));
        let mut driver = SiftDriver::launch(&cfg, profile).await.unwrap();
        let mut page = driver.open_page().await.unwrap();
        page.close().await.unwrap();
        page.close().await.unwrap();
        driver.close().await.unwrap();
        driver.close().await.unwrap();
        assert!(driver.is_closed());
    }
}
