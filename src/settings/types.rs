use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which video source feeds the capturer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SourceSetting {
    /// Synthetic moving gradient.
    TestPattern,
    /// Image file kept fresh by an external grabber.
    Still { path: PathBuf },
}

impl FromStr for SourceSetting {
    type Err = String;

    /// Parse `test-pattern` or `still:<path>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s == "test-pattern" => Ok(Self::TestPattern),
            Some(("still", path)) if !path.is_empty() => Ok(Self::Still {
                path: PathBuf::from(path),
            }),
            _ => Err(format!(
                "invalid source '{s}'; expected 'test-pattern' or 'still:<path>'"
            )),
        }
    }
}

impl fmt::Display for SourceSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TestPattern => f.write_str("test-pattern"),
            Self::Still { path } => write!(f, "still:{}", path.display()),
        }
    }
}

/// On-disk settings file. Every field is optional; unset fields fall back
/// to command-line values or built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub endpoint: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub threshold: Option<f64>,
    pub source: Option<SourceSetting>,
    pub fps: Option<f32>,
    pub snapshot_path: Option<PathBuf>,
    pub capture_interval_secs: Option<u64>,
}

impl SettingsFile {
    /// Layer `overlay` on top of `self`; fields set in `overlay` win.
    pub fn merge(self, overlay: SettingsFile) -> SettingsFile {
        SettingsFile {
            endpoint: overlay.endpoint.or(self.endpoint),
            request_timeout_secs: overlay.request_timeout_secs.or(self.request_timeout_secs),
            threshold: overlay.threshold.or(self.threshold),
            source: overlay.source.or(self.source),
            fps: overlay.fps.or(self.fps),
            snapshot_path: overlay.snapshot_path.or(self.snapshot_path),
            capture_interval_secs: overlay.capture_interval_secs.or(self.capture_interval_secs),
        }
    }
}
