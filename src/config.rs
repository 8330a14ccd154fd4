//! Configuration management for CrabShutter
//!
//! Provides configuration loading, saving, and validation for session timing,
//! capture storage, default quality presets, and focus tap behavior.

use crate::errors::CaptureError;
use crate::quality::QualityCatalog;
use crate::types::CaptureMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrabShutterConfig {
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub quality: QualityConfig,
    pub focus: FocusConfig,
}

/// Capture session behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minimum recording length before a stop is honored, in milliseconds
    pub dwell_time_ms: u64,
    /// Mode the session opens in
    pub default_mode: CaptureMode,
    /// Stay in the last-used mode after confirm instead of returning to the default
    pub remember_last_mode: bool,
}

/// Capture file storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory captured files are persisted into
    pub capture_directory: String,
    /// Extension for persisted photos (without the dot)
    pub photo_extension: String,
    /// Extension for videos whose source path has none
    pub fallback_video_extension: String,
    /// Where recompressed photos are staged; system temp dir when unset
    #[serde(default)]
    pub staging_directory: Option<String>,
}

/// Default quality presets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    pub default_photo_preset: String,
    pub default_video_preset: String,
    /// Build photo tiers from the device's picture sizes when a session opens
    pub derive_from_device: bool,
}

/// Focus tap handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusConfig {
    /// Distance from the preview edge a focus point is clamped to
    pub edge_margin: f32,
    /// How long the focus indicator stays visible, in milliseconds
    pub indicator_ms: u64,
}

impl Default for CrabShutterConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig {
                dwell_time_ms: 1000,
                default_mode: CaptureMode::Photo,
                remember_last_mode: true,
            },
            storage: StorageConfig {
                capture_directory: "./captures".to_string(),
                photo_extension: "jpg".to_string(),
                fallback_video_extension: "mp4".to_string(),
                staging_directory: None,
            },
            quality: QualityConfig {
                default_photo_preset: "medium".to_string(),
                default_video_preset: "720p".to_string(),
                derive_from_device: false,
            },
            focus: FocusConfig {
                edge_margin: 50.0,
                indicator_ms: 1200,
            },
        }
    }
}

impl CrabShutterConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CaptureError::Config(format!("Failed to read config file: {}", e)))?;

        let config: CrabShutterConfig = toml::from_str(&contents)
            .map_err(|e| CaptureError::Config(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CaptureError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                CaptureError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CaptureError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CaptureError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabshutter.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Staging directory for recompressed photos
    pub fn staging_directory(&self) -> PathBuf {
        self.storage
            .staging_directory
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("crabshutter-staging"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.session.dwell_time_ms == 0 || self.session.dwell_time_ms > 10_000 {
            return Err("Dwell time must be between 1 and 10000 ms".to_string());
        }

        if self.storage.capture_directory.trim().is_empty() {
            return Err("Capture directory must not be empty".to_string());
        }
        for (name, ext) in [
            ("photo_extension", &self.storage.photo_extension),
            ("fallback_video_extension", &self.storage.fallback_video_extension),
        ] {
            if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
                return Err(format!("{} must be a bare extension like \"jpg\"", name));
            }
        }

        QualityCatalog::with_defaults(
            &self.quality.default_photo_preset,
            &self.quality.default_video_preset,
        )
        .map_err(|e| e.to_string())?;

        if !self.focus.edge_margin.is_finite() || self.focus.edge_margin < 0.0 {
            return Err("Focus edge margin must be a non-negative number".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CrabShutterConfig::default();
        assert_eq!(config.session.dwell_time_ms, 1000);
        assert_eq!(config.session.default_mode, CaptureMode::Photo);
        assert_eq!(config.quality.default_video_preset, "720p");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut bad_dwell = CrabShutterConfig::default();
        bad_dwell.session.dwell_time_ms = 0;
        assert!(bad_dwell.validate().is_err());

        let mut bad_ext = CrabShutterConfig::default();
        bad_ext.storage.photo_extension = ".jpg".to_string();
        assert!(bad_ext.validate().is_err());

        let mut bad_preset = CrabShutterConfig::default();
        bad_preset.quality.default_photo_preset = "ultra".to_string();
        assert!(bad_preset.validate().is_err());

        let mut bad_margin = CrabShutterConfig::default();
        bad_margin.focus.edge_margin = -1.0;
        assert!(bad_margin.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("conf").join("crabshutter.toml");

        let mut config = CrabShutterConfig::default();
        config.session.default_mode = CaptureMode::Video;
        config.storage.staging_directory = Some("/tmp/stage".to_string());
        config.save_to_file(&config_path).unwrap();

        let loaded = CrabShutterConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_toml_format() {
        let config = CrabShutterConfig::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[session]"));
        assert!(toml_string.contains("[storage]"));
        assert!(toml_string.contains("[quality]"));
        assert!(toml_string.contains("[focus]"));
        assert!(toml_string.contains("dwell_time_ms = 1000"));
        assert!(toml_string.contains("default_mode = \"photo\""));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = CrabShutterConfig::load_from_file("nonexistent_crabshutter.toml");
        assert_eq!(result.unwrap().session.dwell_time_ms, 1000);
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[session\ndwell_time_ms = ").unwrap();
        assert!(matches!(
            CrabShutterConfig::load_from_file(&path),
            Err(CaptureError::Config(_))
        ));
    }

    #[test]
    fn test_staging_directory_defaults_to_temp() {
        let config = CrabShutterConfig::default();
        assert!(config.staging_directory().starts_with(std::env::temp_dir()));
    }
}
