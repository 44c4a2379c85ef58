//! Converter settings, read from an optional JSON file.

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Directory of user profile descriptors (`*.json`).
    pub profiles_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Generator name, see [`crate::generators::generator_for`].
    pub target: String,
    /// Register the built-in profiles before loading user ones.
    pub load_builtin_profiles: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profiles_dir: default_profiles_dir(),
            output_dir: PathBuf::from("."),
            target: "unify".to_string(),
            load_builtin_profiles: true,
        }
    }
}

/// `<config dir>/presetconv/profiles`, or `./profiles` when the platform has
/// no config directory.
pub fn default_profiles_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("presetconv").join("profiles"))
        .unwrap_or_else(|| PathBuf::from("profiles"))
}

/// `<config dir>/presetconv/settings.json`, if the platform has a config directory.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("presetconv").join("settings.json"))
}

impl Settings {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read(path)
            .map_err(|e| ConvertError::io(format!("Failed to read settings {:?}", path), e))?;
        serde_json::from_slice(&content)
            .map_err(|e| ConvertError::malformed(format!("Invalid settings ({e}) in"), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let settings = Settings::load(Path::new("/no/such/settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.target, "unify");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "target": "raw", "loadBuiltinProfiles": false }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.target, "raw");
        assert!(!settings.load_builtin_profiles);
        assert_eq!(settings.output_dir, PathBuf::from("."));
    }

    #[test]
    fn broken_file_is_malformed() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ target = raw").unwrap();

        let err = Settings::load(&path).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedDocument);
    }
}
