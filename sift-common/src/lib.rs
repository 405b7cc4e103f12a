//! Common types and utilities shared across Sift crates.
//!
//! This crate defines the pipeline configuration, the extraction result
//! record, the error taxonomy and observability helpers used throughout the
//! Sift workspace. It is intentionally lightweight so that every crate can
//! depend on it without pulling in the browser or HTTP stacks.
//!
//! # Overview
//!
//! - [`PipelineConfig`]: immutable fetch/retry/fingerprint settings
//! - [`ExtractionResult`]: the normalized article record returned by the pipeline
//! - [`ClassifiedError`] and [`classify`]: attempt-level failure classification
//! - [`SiftError`] and [`Result`]: errors that escape the pipeline
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use sift_common::{classify, ErrorKind, PipelineConfig};
//!
//! let cfg = PipelineConfig::default();
//! assert_eq!(cfg.max_retries, 3);
//! assert!(cfg.is_problematic_host("www.reddit.com"));
//! assert_eq!(classify("net::ERR_NAME_NOT_RESOLVED"), ErrorKind::Permanent);
//! ```
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

pub mod observability;

/// Desktop Chrome user agent presented by every browsing context.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Number of raw body characters the fallback extractor keeps as excerpt.
pub const EXCERPT_CHARS: usize = 150;

/// Browser window dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Settings for one fetch-and-extract pipeline.
///
/// Built once at process start (usually through `sift-config`), wrapped in an
/// `Arc` and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of navigation attempts per invocation.
    pub max_retries: u32,
    /// Base backoff unit; attempt `n` waits `retry_delay_ms * n`.
    pub retry_delay_ms: u64,
    /// Host substrings that get an `https` → `http` downgrade on the second attempt.
    pub problematic_sites: Vec<String>,
    pub navigation_timeout_ms: u64,
    pub dom_ready_timeout_ms: u64,
    /// Extra request headers applied to every page.
    pub headers: BTreeMap<String, String>,
    pub user_agent: String,
    pub viewport: Viewport,
    /// Device pixel ratios; one is picked at random per browsing context.
    pub device_scale_factors: Vec<f64>,
    /// Pre-navigation jitter bounds (inclusive).
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    /// WebDriver (Chromedriver) endpoint.
    pub webdriver_url: String,
    pub headless: bool,
    /// Seed for the randomness source; `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let headers = [
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
            ("Accept-Language", "en-US,en;q=0.9"),
            ("Accept-Encoding", "gzip, deflate, br"),
            ("Cache-Control", "no-cache"),
            ("Upgrade-Insecure-Requests", "1"),
            ("Sec-Fetch-Dest", "document"),
            ("Sec-Fetch-Mode", "navigate"),
            ("Sec-Fetch-Site", "none"),
            ("Sec-Fetch-User", "?1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
            problematic_sites: ["reddit.com", "medium.com", "linkedin.com", "twitter.com", "x.com"]
                .into_iter()
                .map(String::from)
                .collect(),
            navigation_timeout_ms: 30_000,
            dom_ready_timeout_ms: 10_000,
            headers,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport: Viewport::default(),
            device_scale_factors: vec![1.0, 1.25, 1.5, 2.0],
            jitter_min_ms: 500,
            jitter_max_ms: 1500,
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            rng_seed: None,
        }
    }
}

impl PipelineConfig {
    /// Whether `host` matches one of the configured problematic site substrings.
    pub fn is_problematic_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.problematic_sites
            .iter()
            .filter(|s| !s.is_empty())
            .any(|site| host.contains(&site.to_ascii_lowercase()))
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn dom_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.dom_ready_timeout_ms)
    }

    /// Backoff slept before attempt `attempt` (0 for the first attempt).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(attempt as u64))
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(SiftError::Config("max_retries must be at least 1".into()));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(SiftError::Config("viewport dimensions must be non-zero".into()));
        }
        if self.device_scale_factors.is_empty()
            || self.device_scale_factors.iter().any(|f| !(*f > 0.0))
        {
            return Err(SiftError::Config(
                "device_scale_factors must contain positive values".into(),
            ));
        }
        if self.jitter_min_ms > self.jitter_max_ms {
            return Err(SiftError::Config(format!(
                "jitter range is inverted: {}..={}",
                self.jitter_min_ms, self.jitter_max_ms
            )));
        }
        Ok(())
    }
}

/// Normalized article record produced by the pipeline.
///
/// `length` always equals the character count of `text_content`. When
/// `is_readable` is false, `byline` and `site_name` are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub title: String,
    /// HTML fragment of the extracted content.
    pub content: String,
    pub text_content: String,
    pub length: usize,
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    pub is_readable: bool,
}

/// Whether an attempt-level failure may succeed on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Permanent,
    Transient,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Permanent => f.write_str("permanent"),
            ErrorKind::Transient => f.write_str("transient"),
        }
    }
}

/// Message fragments that mark the target as categorically unreachable.
const PERMANENT_PATTERNS: &[&str] = &[
    "err_name_not_resolved",
    "err_name_resolution_failed",
    "err_invalid_url",
    "err_connection_refused",
    "err_address_unreachable",
    "nxdomain",
    "enotfound",
    "econnrefused",
    "getaddrinfo",
    "invalid url",
];

/// Classify a raw failure message.
///
/// ```
/// use sift_common::{classify, ErrorKind};
///
/// assert_eq!(classify("ECONNREFUSED 127.0.0.1:80"), ErrorKind::Permanent);
/// assert_eq!(classify("navigation timed out after 30000ms"), ErrorKind::Transient);
/// ```
pub fn classify(message: &str) -> ErrorKind {
    let lower = message.to_ascii_lowercase();
    if PERMANENT_PATTERNS.iter().any(|p| lower.contains(p)) {
        ErrorKind::Permanent
    } else {
        ErrorKind::Transient
    }
}

/// A failure of one navigation attempt, tagged with its retry class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    /// 0-based attempt index the failure belongs to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
}

impl ClassifiedError {
    /// Build an error whose kind is derived from `message`.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify(&message),
            message,
            attempt: None,
        }
    }

    /// Build a transient error regardless of the message content.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transient,
            message: message.into(),
            attempt: None,
        }
    }

    pub fn at_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    pub fn is_permanent(&self) -> bool {
        self.kind == ErrorKind::Permanent
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.attempt {
            Some(n) => write!(f, "{} (attempt {}, {})", self.message, n + 1, self.kind),
            None => write!(f, "{} ({})", self.message, self.kind),
        }
    }
}

impl std::error::Error for ClassifiedError {}

/// Errors that escape the extraction pipeline.
#[derive(thiserror::Error, Debug)]
pub enum SiftError {
    /// The input is not an absolute `http`/`https` URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The target is categorically unreachable; remaining attempts were skipped.
    #[error("Permanent navigation error: {0}")]
    PermanentNavigation(ClassifiedError),

    /// Every attempt failed with a transient error.
    #[error("Failed after {attempts} attempts: {last}")]
    ExhaustedRetries { attempts: u32, last: ClassifiedError },

    /// The browser session could not be opened.
    #[error("Browser error: {0}")]
    Browser(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient alias for results that use [`SiftError`].
pub type Result<T> = std::result::Result<T, SiftError>;
