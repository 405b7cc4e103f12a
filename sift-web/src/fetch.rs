//! Retrying page fetcher.
//!
//! Each invocation runs a small state machine: it starts in
//! [`FetchState::Attempting`] and ends in exactly one of the terminal states.
//! Strategy selection is a pure function of the attempt index so it can be
//! tested without a browser.
use crate::browser::{BrowsingContext, PageSession};
use sift_common::{ClassifiedError, PipelineConfig, SiftError};
use sift_drivers::sift_browser::behavioral::{BehavioralEngine, Entropy};
use sift_drivers::sift_browser::wait::wait_until;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

const DOM_READY_POLL: Duration = Duration::from_millis(100);

/// How one navigation attempt is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Normal,
    /// Navigate over plain `http` instead of `https`.
    ForceLegacyProtocol,
    /// Back off before navigating.
    Delayed,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Normal => "normal",
            Strategy::ForceLegacyProtocol => "force_legacy_protocol",
            Strategy::Delayed => "delayed",
        })
    }
}

/// Strategy for attempt `attempt` (0-based).
///
/// ```
/// use sift_web::fetch::{select_strategy, Strategy};
///
/// assert_eq!(select_strategy(0, true), Strategy::Normal);
/// assert_eq!(select_strategy(1, true), Strategy::ForceLegacyProtocol);
/// assert_eq!(select_strategy(1, false), Strategy::Delayed);
/// assert_eq!(select_strategy(4, true), Strategy::Delayed);
/// ```
pub fn select_strategy(attempt: u32, is_problematic: bool) -> Strategy {
    match attempt {
        0 => Strategy::Normal,
        1 if is_problematic => Strategy::ForceLegacyProtocol,
        _ => Strategy::Delayed,
    }
}

/// Navigation target for an attempt.
///
/// The legacy-protocol attempt and every even attempt from 2 onwards use the
/// downgraded URL; all others use the original.
pub fn attempt_target(original: &Url, attempt: u32, strategy: Strategy) -> Url {
    let downgrade = match strategy {
        Strategy::ForceLegacyProtocol => true,
        Strategy::Delayed => attempt >= 2 && attempt % 2 == 0,
        Strategy::Normal => false,
    };
    if downgrade {
        downgrade_protocol(original)
    } else {
        original.clone()
    }
}

/// `https` → `http`; any other scheme is returned unchanged.
pub fn downgrade_protocol(url: &Url) -> Url {
    let mut out = url.clone();
    if out.scheme() == "https" && out.set_scheme("http").is_err() {
        return url.clone();
    }
    out
}

/// Backoff slept before an attempt opens its page.
pub fn pre_attempt_delay(config: &PipelineConfig, attempt: u32, strategy: Strategy) -> Duration {
    match strategy {
        Strategy::Delayed => config.backoff_for(attempt),
        Strategy::Normal | Strategy::ForceLegacyProtocol => Duration::ZERO,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Attempting(u32),
    Succeeded(String),
    PermanentlyFailed(ClassifiedError),
    Exhausted(ClassifiedError),
}

impl FetchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FetchState::Attempting(_))
    }
}

/// Record of one navigation attempt. Successful outcomes carry the size of
/// the captured HTML in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAttempt {
    pub index: u32,
    pub strategy: Strategy,
    pub target: Url,
    pub outcome: std::result::Result<usize, ClassifiedError>,
}

#[derive(Debug, Clone)]
pub struct FetchReport {
    pub state: FetchState,
    pub attempts: Vec<FetchAttempt>,
}

impl FetchReport {
    /// Captured HTML, or the error that ended the fetch.
    pub fn into_result(self) -> sift_common::Result<String> {
        let attempts = self.attempts.len() as u32;
        match self.state {
            FetchState::Succeeded(html) => Ok(html),
            FetchState::PermanentlyFailed(err) => Err(SiftError::PermanentNavigation(err)),
            FetchState::Exhausted(last) => Err(SiftError::ExhaustedRetries { attempts, last }),
            FetchState::Attempting(n) => Err(SiftError::ExhaustedRetries {
                attempts,
                last: ClassifiedError::transient(format!("fetch stopped at attempt {n}")),
            }),
        }
    }
}

/// Drives navigation attempts inside one browsing context.
pub struct Fetcher<'a> {
    config: &'a PipelineConfig,
    behavior: BehavioralEngine,
}

impl<'a> Fetcher<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            behavior: BehavioralEngine::new(),
        }
    }

    pub async fn fetch(
        &self,
        context: &mut dyn BrowsingContext,
        url: &Url,
        entropy: &mut Entropy,
    ) -> FetchReport {
        let max_attempts = self.config.max_retries.max(1);
        let problematic = url
            .host_str()
            .is_some_and(|h| self.config.is_problematic_host(h));
        let mut attempts = Vec::new();
        let mut state = FetchState::Attempting(0);

        let state = loop {
            let FetchState::Attempting(n) = state else {
                break state;
            };

            let strategy = select_strategy(n, problematic);
            let target = attempt_target(url, n, strategy);
            let backoff = pre_attempt_delay(self.config, n, strategy);
            if !backoff.is_zero() {
                debug!(
                    target: "fetch",
                    url = %target,
                    attempt = n,
                    backoff_ms = backoff.as_millis() as u64,
                    "fetch.backoff"
                );
                sleep(backoff).await;
            }

            info!(target: "fetch", url = %target, attempt = n, strategy = %strategy, "fetch.attempt");
            let outcome = self
                .attempt(context, &target, entropy)
                .await
                .map_err(|e| e.at_attempt(n));

            attempts.push(FetchAttempt {
                index: n,
                strategy,
                target: target.clone(),
                outcome: outcome.as_ref().map(String::len).map_err(Clone::clone),
            });

            state = match outcome {
                Ok(html) => {
                    info!(target: "fetch", url = %target, attempt = n, bytes = html.len(), "fetch.succeeded");
                    FetchState::Succeeded(html)
                }
                Err(err) if err.is_permanent() => {
                    warn!(target: "fetch", url = %target, attempt = n, kind = %err.kind, error = %err.message, "fetch.permanent_failure");
                    FetchState::PermanentlyFailed(err)
                }
                Err(err) if n + 1 >= max_attempts => {
                    warn!(target: "fetch", url = %target, attempt = n, max_retries = max_attempts, error = %err.message, "fetch.exhausted");
                    FetchState::Exhausted(err)
                }
                Err(err) => {
                    warn!(target: "fetch", url = %target, attempt = n, kind = %err.kind, error = %err.message, "fetch.retrying");
                    FetchState::Attempting(n + 1)
                }
            };
        };

        FetchReport { state, attempts }
    }

    async fn attempt(
        &self,
        context: &mut dyn BrowsingContext,
        target: &Url,
        entropy: &mut Entropy,
    ) -> std::result::Result<String, ClassifiedError> {
        let mut page = context.open_page().await?;
        let result = self.drive(page.as_mut(), target, entropy).await;
        if let Err(err) = page.close().await {
            debug!(target: "browser.session", error = %err, "browser.page.close_failed");
        }
        result
    }

    async fn drive(
        &self,
        page: &mut dyn PageSession,
        target: &Url,
        entropy: &mut Entropy,
    ) -> std::result::Result<String, ClassifiedError> {
        page.apply_headers(&self.config.headers).await?;

        self.behavior
            .random_delay(entropy, self.config.jitter_min_ms, self.config.jitter_max_ms)
            .await;

        match page.navigate(target, self.config.navigation_timeout()).await? {
            None => return Err(ClassifiedError::transient("No response received")),
            Some(status) if !(200..300).contains(&status) => {
                return Err(ClassifiedError::transient(format!("HTTP {status}")));
            }
            Some(_) => {}
        }

        let view: &dyn PageSession = page;
        let ready = wait_until(self.config.dom_ready_timeout(), DOM_READY_POLL, move || {
            view.is_dom_ready()
        })
        .await;
        if !ready.is_ready() {
            debug!(target: "fetch", url = %target, "fetch.dom_ready_timeout");
        }

        let fraction = entropy.fraction();
        if let Err(err) = page.scroll_to(fraction).await {
            warn!(target: "fetch", url = %target, error = %err.message, "fetch.scroll_failed");
        }

        page.content().await
    }
}
