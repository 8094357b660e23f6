// Configuration management
//
// Handles presenter settings and their persistence as TOML.

use crate::clock::{FrameClock, DEFAULT_CYCLE_SECONDS};
use crate::display::{ColorKeypoint, GradientTable, PixelBuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::presenter::{FrameStyle, Presenter};
use crate::session::DEFAULT_FPS_PLACEHOLDER;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Default configuration file path
pub const CONFIG_FILE: &str = "gb_canvas.toml";

/// Largest accepted video width or height
pub const MAX_DIMENSION: usize = 4096;

/// Errors from loading, saving or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Video settings
    pub video: VideoConfig,

    /// Static frame decoration
    pub frame: FrameStyle,

    /// Inset animation
    pub gradient: GradientConfig,

    /// Text surfaces
    pub status: StatusConfig,
}

/// Video configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Pixel buffer width
    pub width: usize,

    /// Pixel buffer height
    pub height: usize,

    /// Window scale (1-8)
    pub scale: u32,

    /// Enable VSync
    pub vsync: bool,

    /// Target refresh rate when the host has no display to sync to
    pub target_fps: u32,
}

/// Gradient configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientConfig {
    /// Seconds per full trip through the gradient
    pub cycle_seconds: f64,

    /// Keypoints in segment order
    pub keypoints: Vec<ColorKeypoint>,
}

/// Status text configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// FPS text shown after the loop stops
    pub fps_placeholder: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        VideoConfig {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            scale: 3,
            vsync: true,
            target_fps: 60,
        }
    }
}

impl Default for GradientConfig {
    fn default() -> Self {
        GradientConfig {
            cycle_seconds: DEFAULT_CYCLE_SECONDS,
            keypoints: GradientTable::hue_cycle().keypoints().to_vec(),
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        StatusConfig {
            fps_placeholder: DEFAULT_FPS_PLACEHOLDER.to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            video: VideoConfig::default(),
            frame: FrameStyle::default(),
            gradient: GradientConfig::default(),
            status: StatusConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file, or fall back to defaults
    ///
    /// When the file is missing or invalid, the defaults are used and an
    /// attempt is made to write them back for the user to edit.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "using default configuration");
            let config = Self::default();
            if !path.exists() {
                match config.save(path) {
                    Ok(()) => tracing::info!(path = %path.display(), "created default configuration file"),
                    Err(e) => tracing::warn!(error = %e, "could not save default configuration"),
                }
            }
            config
        })
    }

    /// Load and validate configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check the settings describe a drawable session
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        let VideoConfig { width, height, .. } = self.video;
        if width == 0 || height == 0 {
            return invalid(format!("video size {}x{} must be non-zero", width, height));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return invalid(format!(
                "video size {}x{} exceeds {} pixels per side",
                width, height, MAX_DIMENSION
            ));
        }
        if self.video.target_fps == 0 {
            return invalid("target_fps must be at least 1".to_string());
        }

        let margin = self.frame.inset_margin;
        if margin.saturating_mul(2) >= width.min(height) {
            return invalid(format!(
                "inset margin {} leaves no room inside {}x{}",
                margin, width, height
            ));
        }

        let cycle = self.gradient.cycle_seconds;
        if !(cycle.is_finite() && cycle > 0.0) {
            return invalid(format!("cycle_seconds must be positive, got {}", cycle));
        }

        let keypoints = &self.gradient.keypoints;
        if keypoints.is_empty() {
            return invalid("gradient needs at least one keypoint".to_string());
        }
        if let Some(k) = keypoints.iter().find(|k| !(0.0..=1.0).contains(&k.position)) {
            return invalid(format!("keypoint position {} outside [0, 1]", k.position));
        }
        if keypoints.windows(2).any(|w| w[1].position < w[0].position) {
            return invalid("keypoint positions must be non-decreasing".to_string());
        }

        Ok(())
    }

    /// Window scale clamped to 1-8
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.video.scale = scale.clamp(1, 8);
        self
    }

    pub fn gradient_table(&self) -> GradientTable {
        GradientTable::new(self.gradient.keypoints.clone())
    }

    /// Build the drawing state for one session
    ///
    /// # Panics
    /// Panics if the configuration does not pass `validate`
    pub fn presenter(&self) -> Presenter {
        Presenter::new(
            PixelBuffer::new(self.video.width, self.video.height),
            FrameClock::new(self.gradient.cycle_seconds),
            self.gradient_table(),
            self.frame,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Rgb;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.video.width, 160);
        assert_eq!(config.video.height, 144);
        assert_eq!(config.video.scale, 3);
        assert_eq!(config.video.target_fps, 60);
        assert_eq!(config.frame.inset_margin, 10);
        assert_eq!(config.gradient.cycle_seconds, 3.0);
        assert_eq!(config.gradient.keypoints.len(), 4);
        assert_eq!(config.status.fps_placeholder, "---");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).expect("Failed to serialize");
        let deserialized = AppConfig::from_toml(&toml_str).expect("Failed to deserialize");
        assert_eq!(config, deserialized);
        assert!(toml_str.contains("#FF0000"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = AppConfig::from_toml(
            r##"
            [video]
            scale = 2

            [frame]
            border_color = "#123456"
            "##,
        )
        .expect("parse");

        assert_eq!(config.video.scale, 2);
        assert_eq!(config.video.width, 160);
        assert_eq!(config.frame.border_color, Rgb::new(0x12, 0x34, 0x56));
        assert_eq!(config.frame.background_color, Rgb::WHITE);
    }

    #[test]
    fn test_custom_keypoints() {
        let config = AppConfig::from_toml(
            r##"
            [gradient]
            cycle_seconds = 1.5
            keypoints = [
                { color = "#000000", position = 0.0 },
                { color = "#FFFFFF", position = 1.0 },
            ]
            "##,
        )
        .expect("parse");

        let table = config.gradient_table();
        assert_eq!(table.color_at(0.0), Rgb::BLACK);
        assert_eq!(table.color_at(1.0), Rgb::WHITE);
        assert_eq!(config.presenter().clock().cycle_seconds(), 1.5);
    }

    #[test]
    fn test_bad_color_is_rejected() {
        let err = AppConfig::from_toml("[frame]\nborder_color = \"black\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::default();
        config.video.width = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.frame.inset_margin = 72;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.gradient.cycle_seconds = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.gradient.keypoints.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.gradient.keypoints.swap(0, 1);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.gradient.keypoints[3].position = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_video_rejected() {
        // 2^62 x 64 would wrap the RGBA byte count on 64-bit targets
        let result = AppConfig::from_toml(
            r#"
            [video]
            width = 4611686018427387904
            height = 64
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.video.height = MAX_DIMENSION + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.video.width = MAX_DIMENSION;
        config.video.height = MAX_DIMENSION;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scale_clamping() {
        assert_eq!(AppConfig::default().with_scale(100).video.scale, 8);
        assert_eq!(AppConfig::default().with_scale(0).video.scale, 1);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = std::env::temp_dir().join(format!("gb_canvas_config_{}", std::process::id()));
        fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join("config.toml");

        let config = AppConfig::default().with_scale(4);
        config.save(&path).expect("save");
        assert_eq!(AppConfig::load(&path).expect("load"), config);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
