//! Chrome DevTools commands tunnelled through Chromedriver's
//! `goog/cdp/execute` vendor endpoint.
use fantoccini::wd::WebDriverCompatibleCommand;
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct CdpCommand {
    pub cmd: String,
    pub params: Value,
}

impl CdpCommand {
    pub fn new(cmd: impl Into<String>, params: Value) -> Self {
        Self {
            cmd: cmd.into(),
            params,
        }
    }

    pub fn enable_network() -> Self {
        Self::new("Network.enable", json!({}))
    }

    /// Headers sent with every request issued by the current tab.
    pub fn set_extra_headers(headers: &BTreeMap<String, String>) -> Self {
        Self::new("Network.setExtraHTTPHeaders", json!({ "headers": headers }))
    }

    fn body(&self) -> String {
        json!({ "cmd": self.cmd, "params": self.params }).to_string()
    }
}

impl WebDriverCompatibleCommand for CdpCommand {
    fn endpoint(
        &self,
        base_url: &url::Url,
        session_id: Option<&str>,
    ) -> Result<url::Url, url::ParseError> {
        let session = session_id.unwrap_or_default();
        base_url.join(&format!("session/{session}/goog/cdp/execute"))
    }

    fn method_and_body(&self, _request_url: &url::Url) -> (http::Method, Option<String>) {
        (http::Method::POST, Some(self.body()))
    }
}
