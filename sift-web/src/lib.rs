//! Web page acquisition and article extraction.
//!
//! - URL validation (`validate`)
//! - Browser session traits and the Chromedriver-backed implementation (`browser`)
//! - Retrying fetch state machine (`fetch`)
//! - HTML sanitizing (`sanitize`), article extraction (`extract`) and text
//!   normalization (`normalize`)
//! - The end-to-end [`Pipeline`] tying them together
//!
//! ```no_run
//! # async fn run() -> sift_common::Result<()> {
//! use sift_common::PipelineConfig;
//!
//! let article = sift_web::extract("https://example.com/post", PipelineConfig::default()).await?;
//! println!("{} ({} chars)", article.title, article.length);
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod sanitize;
pub mod validate;

pub use pipeline::{ContextGuard, Pipeline, extract};
