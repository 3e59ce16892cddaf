pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

use crate::preview::encode::BinaryPayload;
use error::Result;
use types::ClassificationResult;

/// Remote image classifier.
///
/// The pipeline only depends on this trait; [`client::ClassificationClient`]
/// is the HTTP implementation.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Submit one payload and wait for the verdict.
    async fn classify(&self, payload: BinaryPayload) -> Result<ClassificationResult>;
}
