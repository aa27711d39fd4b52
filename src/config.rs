// SPDX-License-Identifier: GPL-3.0-only

//! User configuration handling
//!
//! Configuration is stored as JSON under the user config directory
//! (`~/.config/photobooth/config.json`). A missing or unparsable file falls
//! back to defaults with a warning; nothing is written until `save`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Last used camera device path
    pub last_camera_path: Option<String>,
    /// Directory the composite is saved into (default: ~/Pictures/PhotoBooth)
    pub output_dir: Option<PathBuf>,
    /// Overlay PNG drawn over the composite
    pub overlay_path: Option<PathBuf>,
    /// Mirror camera preview horizontally (selfie mode); captures are not mirrored
    pub mirror_preview: bool,
    /// Open the composite in the default viewer after saving
    pub open_after_save: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            last_camera_path: None,
            output_dir: None,
            overlay_path: None,
            mirror_preview: true, // Default to mirrored (selfie mode)
            open_after_save: false,
        }
    }
}

impl Config {
    /// Load the configuration, falling back to defaults on any failure
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            warn!("No config directory available, using defaults");
            return Self::default();
        };

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(config) => {
                debug!(path = %path.display(), "Loaded config");
                config
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to parse config, using defaults");
                Self::default()
            }
        }
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save(&self) -> crate::errors::BoothResult<()> {
        let path = Self::config_path()
            .ok_or_else(|| crate::errors::BoothError::Config("no config directory".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| crate::errors::BoothError::Config(e.to_string()))?;
        std::fs::write(&path, contents)?;

        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Path of the config file, if a config directory exists
    pub fn config_path() -> Option<PathBuf> {
        Some(Self::config_dir()?.join("config.json"))
    }

    /// The application's config directory
    pub fn config_dir() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("photobooth"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.mirror_preview);
        assert!(!config.open_after_save);
        assert!(config.overlay_path.is_none());
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = Config::default();
        config.last_camera_path = Some("/dev/video0".to_string());
        config.overlay_path = Some(PathBuf::from("/tmp/frame.png"));

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_fields_use_defaults() {
        // Older or partial config files must still parse
        let parsed: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, Config::default());
    }
}
