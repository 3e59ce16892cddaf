use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use super::types::{SettingsFile, SourceSetting};
use super::SettingsError;
use crate::camera::dummy::TestPatternSource;
use crate::classify::client::{check_endpoint, check_threshold};

/// Feed rate used when none is configured.
pub const DEFAULT_FPS: f32 = 15.0;

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub endpoint: Url,
    pub request_timeout: Option<Duration>,
    pub threshold: Option<f64>,
    pub source: SourceSetting,
    pub fps: f32,
    pub snapshot_path: Option<PathBuf>,
    pub capture_interval: Option<Duration>,
}

/// Parse and check the classification endpoint.
pub fn parse_endpoint(raw: &str) -> Result<Url, SettingsError> {
    let invalid = |reason: String| SettingsError::InvalidEndpoint {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    check_endpoint(&url).map_err(invalid)?;
    Ok(url)
}

fn positive_secs(field: &'static str, secs: Option<u64>) -> Result<Option<Duration>, SettingsError> {
    match secs {
        Some(0) => Err(SettingsError::Invalid {
            field,
            reason: "must be greater than zero".to_string(),
        }),
        other => Ok(other.map(Duration::from_secs)),
    }
}

impl TryFrom<SettingsFile> for MonitorConfig {
    type Error = SettingsError;

    fn try_from(file: SettingsFile) -> Result<Self, SettingsError> {
        let endpoint = file
            .endpoint
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(SettingsError::MissingEndpoint)
            .and_then(parse_endpoint)?;

        if let Some(threshold) = file.threshold {
            check_threshold(threshold).map_err(|reason| SettingsError::Invalid {
                field: "threshold",
                reason,
            })?;
        }

        let fps = file.fps.unwrap_or(DEFAULT_FPS);
        if !(fps.is_finite() && fps > 0.0) {
            return Err(SettingsError::Invalid {
                field: "fps",
                reason: format!("{fps} is not a positive frame rate"),
            });
        }

        let source = match file.source {
            Some(source) => source,
            None if TestPatternSource::is_enabled() => SourceSetting::TestPattern,
            None => return Err(SettingsError::MissingSource),
        };

        Ok(Self {
            endpoint,
            request_timeout: positive_secs("request_timeout_secs", file.request_timeout_secs)?,
            threshold: file.threshold,
            source,
            fps,
            snapshot_path: file.snapshot_path,
            capture_interval: positive_secs("capture_interval_secs", file.capture_interval_secs)?,
        })
    }
}
