//! Driver layer for browser automation.
//!
//! This crate owns the WebDriver session lifecycle used by the extraction
//! pipeline and the helpers that make a session look like ordinary traffic.
//!
//! - [`sift_browser::driver::SiftDriver`]: one isolated Chromedriver session
//! - [`sift_browser::page::SiftPage`]: one tab inside that session
//! - [`sift_browser::fingerprint::FingerprintProfile`]: user agent, viewport, pixel ratio
//! - [`sift_browser::behavioral::Entropy`]: seedable randomness for jitter and scrolling
//! - [`sift_browser::stealth`]: Chrome arguments and JS evasions
//! - [`sift_browser::wait::wait_until`]: bounded "condition or deadline" wait
pub mod sift_browser;
