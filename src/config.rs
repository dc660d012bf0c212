//! Application configuration.
//!
//! Read from `billboard.json` in the working directory, or from the file named by the
//! `BILLBOARD_CONFIG` environment variable. Missing files fall back to defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "billboard.json";
/// Environment variable overriding the config file path.
pub const CONFIG_ENV_VAR: &str = "BILLBOARD_CONFIG";

/// Runtime settings for the editor and the export engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory that public URLs such as `/billboard.png` resolve against
    pub public_dir: PathBuf,
    /// Public URL of the background asset
    pub background: String,
    /// Directory scanned for bundled font files
    pub fonts_dir: PathBuf,
    /// Whether installed system fonts are loaded as well
    pub system_fonts: bool,
    /// Per-load bound in milliseconds; 0 waits indefinitely
    pub load_timeout_ms: u64,
    /// Where exports are written when no save dialog is shown
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from("public"),
            background: "/billboard.png".to_string(),
            fonts_dir: PathBuf::from("public/fonts"),
            system_fonts: true,
            load_timeout_ms: 15_000,
            output_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from the environment-selected path or the default file.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        Self::load_from(&path)
    }

    /// Loads the configuration from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// The load bound, or `None` when loads may wait indefinitely.
    pub fn load_timeout(&self) -> Option<Duration> {
        (self.load_timeout_ms > 0).then(|| Duration::from_millis(self.load_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("billboard-config-{}-{}", uuid::Uuid::new_v4(), name))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load_from(&temp_path("absent.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.load_timeout(), Some(Duration::from_millis(15_000)));
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let path = temp_path("partial.json");
        std::fs::write(&path, r#"{ "load_timeout_ms": 0, "background": "/night.png" }"#).unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.background, "/night.png");
        assert_eq!(config.load_timeout(), None);
        assert_eq!(config.public_dir, PathBuf::from("public"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = temp_path("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Parse { .. })));
        let _ = std::fs::remove_file(path);
    }
}
