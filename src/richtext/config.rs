// Editor configuration
// Tunables for layout and caret presentation, stored as TOML

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

use super::error::ConfigError;

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "richtext";
const APPLICATION: &str = "richtext-core";
const CONFIG_FILE_NAME: &str = "editor.toml";

/// Pixel sizes of the four logical text styles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    pub header: f32,
    pub sub_header: f32,
    pub paragraph: f32,
    pub list: f32,
}

impl Default for FontSizes {
    fn default() -> Self {
        FontSizes {
            header: 28.0,
            sub_header: 22.0,
            paragraph: 16.0,
            list: 16.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Width available to text before indentation is subtracted
    pub wrap_width: f32,
    /// Horizontal space per indent level
    pub indent_width: f32,
    /// Full on/off period of the local caret
    pub blink_period_ms: u64,
    /// How long a remote caret stays fully visible after its last update
    pub remote_fade_delay_ms: u64,
    /// How long a remote caret takes to fade out afterwards
    pub remote_fade_duration_ms: u64,
    pub read_only: bool,
    pub fonts: FontSizes,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            wrap_width: 480.0,
            indent_width: 24.0,
            blink_period_ms: 1000,
            remote_fade_delay_ms: 5000,
            remote_fade_duration_ms: 1000,
            read_only: false,
            fonts: FontSizes::default(),
        }
    }
}

impl EditorConfig {
    /// Per-user location of the config file
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load `path` (or the per-user config file), falling back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Some(path) if path.exists() => path,
                _ => return Self::default(),
            },
        };

        match Self::load(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!("Failed to load editor config {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = EditorConfig::from_toml_str(
            r#"
            indent_width = 32.0

            [fonts]
            header = 40.0
            "#,
        )
        .unwrap();
        assert_eq!(config.indent_width, 32.0);
        assert_eq!(config.fonts.header, 40.0);
        assert_eq!(config.fonts.paragraph, FontSizes::default().paragraph);
        assert_eq!(config.blink_period_ms, 1000);
    }

    #[test]
    fn test_round_trip() {
        let config = EditorConfig {
            wrap_width: 300.0,
            read_only: true,
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(EditorConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let err = EditorConfig::from_toml_str("wrap_width = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = EditorConfig::load_or_default(Some(Path::new("/nonexistent/editor.toml")));
        assert_eq!(config, EditorConfig::default());
    }
}
