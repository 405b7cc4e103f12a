//! Front ends for the Sift pipeline: a JSON HTTP endpoint and a stdio
//! JSON-RPC tool server. Both depend only on the [`Extractor`] trait.

pub mod extractor;
pub mod http;
pub mod protocol;
pub mod tool;

pub use extractor::Extractor;
pub use http::{AppState, HttpServer, router};
pub use tool::ToolServer;
