// SPDX-License-Identifier: MIT OR Apache-2.0
//! Application configuration stored as RON.

use glyphmotion_field::field::DEFAULT_LERP_RATE;
use glyphmotion_field::{builtin_preset, EffectPreset, EffectSpeeds};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "glyphmotion.ron";

/// Errors loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("Config I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid RON
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: ron::error::SpannedError,
    },

    /// Serializing to RON failed
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),

    /// Frame rate must be positive and finite
    #[error("Frame rate must be positive and finite, got {0}")]
    InvalidFps(f64),
}

/// Application settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Text rendered as particles
    pub text: String,
    /// Optional grid font JSON; the built-in block font is used otherwise
    pub font: Option<PathBuf>,
    /// Wrap playback at the end of the timeline
    pub looping: bool,
    /// Frame rate of the play loop and capture
    pub fps: f64,
    /// Smoothing rate of effect parameters
    pub lerp_rate: f64,
    /// Effect speeds before any preset is applied
    pub speeds: EffectSpeeds,
    /// Preset applied at startup
    pub preset: Option<String>,
    /// User presets, in declaration order
    pub presets: IndexMap<String, EffectPreset>,
    /// Debounce window for animation file reloads, in milliseconds
    pub reload_debounce_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            text: "GLYPH MOTION".to_string(),
            font: None,
            looping: true,
            fps: 60.0,
            lerp_rate: DEFAULT_LERP_RATE,
            speeds: EffectSpeeds::default(),
            preset: None,
            presets: IndexMap::new(),
            reload_debounce_ms: 250,
        }
    }
}

impl AppConfig {
    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, else the default file if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(CONFIG_FILE_NAME);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    tracing::debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save settings as pretty RON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_fps(self.fps)
    }

    /// Seconds per frame
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }

    /// Reload debounce window
    pub fn reload_debounce(&self) -> Duration {
        Duration::from_millis(self.reload_debounce_ms)
    }

    /// Find a preset by name. User presets shadow built-in ones.
    pub fn find_preset(&self, name: &str) -> Option<EffectPreset> {
        self.presets
            .get(name)
            .copied()
            .or_else(|| builtin_preset(name))
    }
}

/// Reject frame rates that are not positive and finite
pub fn validate_fps(fps: f64) -> Result<(), ConfigError> {
    if fps > 0.0 && fps.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidFps(fps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = ron::from_str(r#"(text: "HI", fps: 30.0)"#).unwrap();
        assert_eq!(config.text, "HI");
        assert_eq!(config.fps, 30.0);
        assert!(config.looping);
        assert_eq!(config.speeds, EffectSpeeds::default());
        assert_eq!(config.reload_debounce(), Duration::from_millis(250));
    }

    #[test]
    fn test_user_presets_keep_order_and_shadow_builtins() {
        let config: AppConfig = ron::from_str(
            r#"(
                presets: {
                    "Zoom": (scaleAmount: 0.5),
                    "Pulse": (particleSize: 1.0),
                    "Alpha": (),
                },
            )"#,
        )
        .unwrap();

        let names: Vec<_> = config.presets.keys().map(String::as_str).collect();
        assert_eq!(names, ["Zoom", "Pulse", "Alpha"]);
        assert_eq!(config.find_preset("Pulse").unwrap().particle_size, 1.0);
        assert_eq!(config.find_preset("Wave").unwrap().wave_amount, 3.0);
        assert!(config.find_preset("Nope").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("glyphmotion-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);

        let mut config = AppConfig::default();
        config.text = "SAVED".to_string();
        config.presets.insert("Mine".to_string(), EffectPreset::default());
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_invalid_fps_rejected() {
        let dir = std::env::temp_dir().join(format!("glyphmotion-fps-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.ron");
        std::fs::write(&path, "(fps: 0.0)").unwrap();

        assert!(matches!(AppConfig::load(&path), Err(ConfigError::InvalidFps(_))));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_validate_fps() {
        assert!(validate_fps(24.0).is_ok());
        for fps in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            assert!(matches!(validate_fps(fps), Err(ConfigError::InvalidFps(_))));
        }
    }
}
