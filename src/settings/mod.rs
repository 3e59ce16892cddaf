pub mod config;
pub mod store;
pub mod types;

use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("classification endpoint is not configured (set --endpoint or DROWSY_API_URL)")]
    MissingEndpoint,

    #[error("invalid classification endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("no video source configured (use --source test-pattern|still:<path> or DUMMY_CAMERA=1)")]
    MissingSource,

    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
