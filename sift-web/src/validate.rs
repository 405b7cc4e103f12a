use sift_common::{Result, SiftError};
use url::Url;

/// Parse `raw` as an absolute `http`/`https` URL with a host.
///
/// Runs before any browser resource is acquired.
pub fn validate_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| SiftError::InvalidUrl(format!("{trimmed}: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(SiftError::InvalidUrl(format!(
                "{trimmed}: unsupported scheme '{other}'"
            )));
        }
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(SiftError::InvalidUrl(format!("{trimmed}: missing host")));
    }
    Ok(url)
}
