pub mod controller;

use thiserror::Error;

use crate::camera::error::CaptureError;
use crate::classify::error::ClassifyError;
use crate::diagnostics::stats::FailureKind;

/// Any failure that ends a pipeline cycle early.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("classification failed: {0}")]
    Classify(#[from] ClassifyError),
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Capture(_) => FailureKind::Capture,
            Self::Classify(e) if e.is_malformed() => FailureKind::Malformed,
            Self::Classify(_) => FailureKind::Request,
        }
    }
}
