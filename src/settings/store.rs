use std::path::Path;

use super::types::SettingsFile;
use super::SettingsError;

/// Read-only access to the JSON settings file.
pub struct SettingsStore;

impl SettingsStore {
    /// Load settings from a JSON file, returning defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<SettingsFile, SettingsError> {
        if !path.exists() {
            tracing::debug!("settings file {} not found, using defaults", path.display());
            return Ok(SettingsFile::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::types::SourceSetting;
    use tempfile::TempDir;

    #[test]
    fn load_returns_default_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nonexistent.json");
        let result = SettingsStore::load(&path).unwrap();
        assert_eq!(result, SettingsFile::default());
    }

    #[test]
    fn load_parses_valid_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("drowsy-watch.json");
        let json = r#"{"endpoint":"https://api.example/predict","source":{"kind":"test-pattern"}}"#;
        std::fs::write(&path, json).unwrap();

        let result = SettingsStore::load(&path).unwrap();
        assert_eq!(result.endpoint.as_deref(), Some("https://api.example/predict"));
        assert_eq!(result.source, Some(SourceSetting::TestPattern));
    }

    #[test]
    fn load_returns_error_for_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("drowsy-watch.json");
        std::fs::write(&path, "not valid json!!!").unwrap();

        let result = SettingsStore::load(&path);
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn load_returns_error_for_directory() {
        let dir = TempDir::new().unwrap();
        let result = SettingsStore::load(dir.path());
        assert!(matches!(result, Err(SettingsError::Io(_))));
    }
}
