use thiserror::Error;

/// Frame capture and still-image encoding errors.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no frame available from video source")]
    NoFrame,

    #[error("latest frame is stale ({age_ms} ms old)")]
    StaleFrame { age_ms: u128 },

    #[error("video source failed to open: {0}")]
    SourceOpen(String),

    #[error("video source read failed: {0}")]
    SourceRead(String),

    #[error("frame resize failed: {0}")]
    Resize(String),

    #[error("JPEG encoding failed: {0}")]
    Encode(String),

    #[error("image decode failed: {0}")]
    Decode(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CaptureError>;
