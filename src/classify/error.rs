use thiserror::Error;

/// Classification request errors.
///
/// `Transport` and `Status` are request failures; `Malformed` means the
/// service answered with a success status but an unusable body.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API request failed: HTTP {0}")]
    Status(u16),

    #[error("malformed classification response: {0}")]
    Malformed(String),

    #[error("invalid classification request: {0}")]
    InvalidRequest(String),
}

impl ClassifyError {
    /// Whether the service was reached and answered with a usable status.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, ClassifyError>;
