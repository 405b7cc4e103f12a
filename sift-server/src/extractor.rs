use async_trait::async_trait;
use sift_common::{ExtractionResult, Result};
use sift_web::Pipeline;

/// Anything that turns a URL into an [`ExtractionResult`].
///
/// Both front ends hold an `Arc<dyn Extractor>` so they can be exercised
/// without a browser.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractionResult>;
}

#[async_trait]
impl Extractor for Pipeline {
    async fn extract(&self, url: &str) -> Result<ExtractionResult> {
        Pipeline::extract(self, url).await
    }
}
