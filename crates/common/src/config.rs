//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReelError, ReelResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Parameters consumed by the scheduling engine.
    pub engine: EngineConfig,

    /// Encoder settings used at the ffmpeg boundary.
    pub encoder: EncoderConfig,

    /// Source preparation before cutting.
    pub prepare: PrepareConfig,

    /// Working and output directories.
    pub paths: PathsConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Layout and timing parameters for segment planning and overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Shortest segment the planner will emit (seconds).
    pub min_segment_duration: f64,

    /// Reserved upper bound for segment length (seconds). Not enforced.
    pub max_segment_duration: f64,

    /// Configured enter/exit animation length (seconds).
    pub animation_duration: f64,

    /// Largest fraction of the frame an overlay image may occupy per axis.
    pub image_max_size_ratio: f64,

    /// Caption font size lower bound (px).
    pub text_min_font_size: u32,

    /// Caption font size upper bound (px).
    pub text_max_font_size: u32,

    /// Padding around the caption inside its box (px).
    pub text_padding: u32,

    /// Distance between the caption box and the bottom edge (px).
    pub text_bottom_margin: u32,
}

/// Encoder parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Video codec passed to `-c:v`.
    pub video_codec: String,

    /// Encoder preset for final renders.
    pub preset: String,

    /// Encoder preset for intermediate segment extraction.
    pub segment_preset: String,

    /// Constant rate factor.
    pub crf: u8,

    /// Output frame rate.
    pub fps: u32,

    /// Audio codec passed to `-c:a`.
    pub audio_codec: String,

    /// Audio bitrate (e.g. "192k").
    pub audio_bitrate: String,

    /// ffmpeg `-loglevel`.
    pub loglevel: String,

    /// Upper bound on a single encoder invocation (seconds, 0 = none).
    pub timeout_secs: u64,
}

/// Normalization applied to source videos before they are combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    /// Frame size every source is brought to.
    pub resolution: ResolutionPreset,

    /// How sources with a different aspect ratio are fitted.
    pub crop: CropMode,

    /// Light temporal denoise (`hqdn3d`).
    pub denoise: bool,

    /// Stabilization (`deshake`).
    pub deshake: bool,

    /// Unsharp mask.
    pub sharpen: bool,
}

/// Directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Parent directory for per-run scratch space.
    pub work_dir: PathBuf,

    /// Default directory for finished renders.
    pub output_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelcut=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_segment_duration: 0.3,
            max_segment_duration: 5.0,
            animation_duration: 0.5,
            image_max_size_ratio: 0.85,
            text_min_font_size: 24,
            text_max_font_size: 80,
            text_padding: 20,
            text_bottom_margin: 100,
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            segment_preset: "ultrafast".to_string(),
            crf: 23,
            fps: 30,
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            loglevel: "error".to_string(),
            timeout_secs: 1800,
        }
    }
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            resolution: ResolutionPreset::Reels,
            crop: CropMode::Center,
            denoise: false,
            deshake: false,
            sharpen: false,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let base = data_dir();
        Self {
            work_dir: std::env::temp_dir().join("reelcut"),
            output_dir: base.join("outputs"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Reject parameter combinations the engine cannot work with.
    pub fn validate(&self) -> ReelResult<()> {
        if !(self.min_segment_duration > 0.0) {
            return Err(ReelError::config("min_segment_duration must be positive"));
        }
        if self.max_segment_duration < self.min_segment_duration {
            return Err(ReelError::config(
                "max_segment_duration must not be below min_segment_duration",
            ));
        }
        if self.animation_duration < 0.0 {
            return Err(ReelError::config("animation_duration must not be negative"));
        }
        if !(self.image_max_size_ratio > 0.0 && self.image_max_size_ratio <= 1.0) {
            return Err(ReelError::config("image_max_size_ratio must be in (0, 1]"));
        }
        if self.text_min_font_size == 0 || self.text_min_font_size > self.text_max_font_size {
            return Err(ReelError::config(
                "text font bounds must satisfy 0 < min <= max",
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> ReelResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReelError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ReelError::config(format!("Failed to parse {}: {e}", path.display()))
        })?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Output resolution presets for common short-form targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPreset {
    Reels,
    Shorts,
    Story,
    Landscape,
    Square,
}

impl ResolutionPreset {
    /// `(width, height)` in pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            ResolutionPreset::Reels | ResolutionPreset::Shorts | ResolutionPreset::Story => {
                (1080, 1920)
            }
            ResolutionPreset::Landscape => (1920, 1080),
            ResolutionPreset::Square => (1080, 1080),
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "reels" => Some(Self::Reels),
            "shorts" => Some(Self::Shorts),
            "story" => Some(Self::Story),
            "landscape" => Some(Self::Landscape),
            "square" => Some(Self::Square),
            _ => None,
        }
    }
}

/// How a source with a different aspect ratio is brought to the target size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropMode {
    /// Crop the centered target-aspect region, then scale.
    #[default]
    Center,
    /// Scale to fit inside the target and pad with black bars.
    Fit,
    /// Scale to the target, ignoring aspect ratio.
    Stretch,
}

impl CropMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Fit => "fit",
            Self::Stretch => "stretch",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "center" => Some(Self::Center),
            "fit" => Some(Self::Fit),
            "stretch" => Some(Self::Stretch),
            _ => None,
        }
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelcut").join("config.json")
}

fn data_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("reelcut")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults_are_valid() {
        let engine = EngineConfig::default();
        assert!(engine.validate().is_ok());
        assert_eq!(engine.min_segment_duration, 0.3);
        assert_eq!(engine.text_min_font_size, 24);
        assert_eq!(engine.text_max_font_size, 80);
    }

    #[test]
    fn test_validate_rejects_inverted_font_bounds() {
        let engine = EngineConfig {
            text_min_font_size: 90,
            ..Default::default()
        };
        assert!(matches!(engine.validate(), Err(ReelError::Config { .. })));
    }

    #[test]
    fn test_validate_rejects_size_ratio_above_one() {
        let engine = EngineConfig {
            image_max_size_ratio: 1.5,
            ..Default::default()
        };
        assert!(engine.validate().is_err());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"engine":{"animation_duration":0.8}}"#).unwrap();
        assert_eq!(config.engine.animation_duration, 0.8);
        assert_eq!(config.engine.min_segment_duration, 0.3);
        assert_eq!(config.encoder.video_codec, "libx264");
    }

    #[test]
    fn test_save_and_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.encoder.crf = 18;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.encoder.crf, 18);
    }

    #[test]
    fn test_load_from_reports_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ReelError::Config { .. })
        ));
    }

    #[test]
    fn test_resolution_presets() {
        assert_eq!(ResolutionPreset::Reels.dimensions(), (1080, 1920));
        assert_eq!(
            ResolutionPreset::parse("Landscape"),
            Some(ResolutionPreset::Landscape)
        );
        assert_eq!(ResolutionPreset::parse("cinema"), None);
    }

    #[test]
    fn test_prepare_defaults_and_partial_override() {
        let config: AppConfig =
            serde_json::from_str(r#"{"prepare":{"crop":"fit","denoise":true}}"#).unwrap();
        assert_eq!(config.prepare.crop, CropMode::Fit);
        assert!(config.prepare.denoise);
        assert!(!config.prepare.deshake);
        assert_eq!(config.prepare.resolution, ResolutionPreset::Reels);

        assert_eq!(CropMode::parse("Stretch"), Some(CropMode::Stretch));
        assert_eq!(CropMode::parse("zoom"), None);
    }
}
