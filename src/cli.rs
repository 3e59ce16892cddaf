use clap::Parser;
use std::path::PathBuf;

use crate::settings::config::MonitorConfig;
use crate::settings::store::SettingsStore;
use crate::settings::types::{SettingsFile, SourceSetting};
use crate::settings::SettingsError;

/// Webcam drowsiness monitor
#[derive(Parser, Debug, Default)]
#[command(name = "drowsy-watch")]
#[command(version)]
#[command(about = "Capture webcam stills and flag drowsiness via a remote classifier", long_about = None)]
pub struct Cli {
    /// JSON settings file; command-line values override it
    #[arg(long, env = "DROWSY_WATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Absolute URL of the prediction endpoint
    #[arg(long, env = "DROWSY_API_URL")]
    pub endpoint: Option<String>,

    /// Video source: `test-pattern` or `still:<path>`
    #[arg(long, env = "DROWSY_SOURCE")]
    pub source: Option<SourceSetting>,

    /// Frames per second pulled from the source
    #[arg(long)]
    pub fps: Option<f32>,

    /// Request timeout in seconds (default: none)
    #[arg(long = "timeout", env = "DROWSY_REQUEST_TIMEOUT")]
    pub request_timeout_secs: Option<u64>,

    /// Decision threshold forwarded to the classifier
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Write the last captured image to this file
    #[arg(long = "snapshot")]
    pub snapshot_path: Option<PathBuf>,

    /// Trigger a capture automatically every N seconds
    #[arg(long = "interval")]
    pub capture_interval_secs: Option<u64>,
}

impl Cli {
    /// Values given on the command line or through the environment.
    pub fn overrides(&self) -> SettingsFile {
        SettingsFile {
            endpoint: self.endpoint.clone(),
            request_timeout_secs: self.request_timeout_secs,
            threshold: self.threshold,
            source: self.source.clone(),
            fps: self.fps,
            snapshot_path: self.snapshot_path.clone(),
            capture_interval_secs: self.capture_interval_secs,
        }
    }

    /// Merge the settings file (if any) with command-line values.
    pub fn resolve(&self) -> Result<MonitorConfig, SettingsError> {
        let base = match &self.config {
            Some(path) => SettingsStore::load(path)?,
            None => SettingsFile::default(),
        };
        MonitorConfig::try_from(base.merge(self.overrides()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "drowsy-watch",
            "--endpoint",
            "https://api.example/predict",
            "--source",
            "still:/tmp/frame.jpg",
            "--fps",
            "10",
            "--timeout",
            "15",
            "--threshold",
            "0.8",
            "--snapshot",
            "/tmp/last.jpg",
            "--interval",
            "60",
        ])
        .unwrap();

        assert_eq!(cli.endpoint.as_deref(), Some("https://api.example/predict"));
        assert_eq!(
            cli.source,
            Some(SourceSetting::Still {
                path: PathBuf::from("/tmp/frame.jpg")
            })
        );
        assert_eq!(cli.fps, Some(10.0));
        assert_eq!(cli.request_timeout_secs, Some(15));
        assert_eq!(cli.capture_interval_secs, Some(60));
    }

    #[test]
    fn rejects_bad_source() {
        let result = Cli::try_parse_from(["drowsy-watch", "--source", "usb0"]);
        assert!(result.is_err());
    }

    #[test]
    fn command_line_overrides_settings_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"endpoint":"https://file.example/predict","fps":5.0,"source":{"kind":"test-pattern"}}"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(path),
            endpoint: Some("https://cli.example/predict".to_string()),
            ..Cli::default()
        };
        let config = cli.resolve().unwrap();
        assert_eq!(config.endpoint.as_str(), "https://cli.example/predict");
        assert_eq!(config.fps, 5.0);
        assert_eq!(config.source, SourceSetting::TestPattern);
    }

    #[test]
    fn resolve_surfaces_settings_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{").unwrap();

        let cli = Cli {
            config: Some(path),
            ..Cli::default()
        };
        assert!(matches!(cli.resolve(), Err(SettingsError::Parse(_))));
    }
}
