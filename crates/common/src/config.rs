//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where exported artifacts are written.
    pub output_dir: PathBuf,

    /// Frame generation settings.
    pub render: RenderSettings,

    /// Encoder strategy settings.
    pub encoder: EncoderSettings,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Frame generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Frames rendered per second of scene time.
    pub fps: u32,

    /// Upper bound on frames rendered for a single scene, regardless of
    /// its duration. Motion past the cap is not rendered.
    pub max_frames_per_scene: u32,

    /// Optional TrueType/OpenType font for overlay text. The built-in block
    /// face is used when unset or unreadable.
    pub font_path: Option<PathBuf>,
}

/// Encoder strategy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Keep every Nth frame for the animated image output.
    pub gif_frame_stride: usize,

    /// Delay between animated image frames (ms).
    pub gif_frame_delay_ms: u32,

    /// Quantizer speed for the animated image output (1 = best, 30 = fastest).
    pub gif_speed: i32,

    /// Capture rate for the streaming container.
    pub capture_fps: u32,

    /// Contact-sheet thumbnail size.
    pub contact_cell_width: u32,
    pub contact_cell_height: u32,

    /// Executable used by the streaming capture backend.
    pub ffmpeg_binary: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "storyreel=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            render: RenderSettings::default(),
            encoder: EncoderSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            fps: 10,
            max_frames_per_scene: 30,
            font_path: None,
        }
    }
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            gif_frame_stride: 10,
            gif_frame_delay_ms: 330,
            gif_speed: 10,
            capture_fps: 10,
            contact_cell_width: 320,
            contact_cell_height: 180,
            ffmpeg_binary: "ffmpeg".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl RenderSettings {
    /// Number of frames rendered for a scene of the given length.
    pub fn frames_for_scene(&self, duration_secs: u32) -> u32 {
        duration_secs
            .saturating_mul(self.fps)
            .min(self.max_frames_per_scene)
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
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
    base.join("storyreel").join("config.json")
}

/// Default export directory.
fn default_output_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("storyreel").join("exports")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_export_constants() {
        let config = AppConfig::default();
        assert_eq!(config.render.fps, 10);
        assert_eq!(config.render.max_frames_per_scene, 30);
        assert_eq!(config.encoder.gif_frame_stride, 10);
        assert_eq!(config.encoder.gif_frame_delay_ms, 330);
        assert_eq!(config.encoder.capture_fps, 10);
        assert_eq!(
            (
                config.encoder.contact_cell_width,
                config.encoder.contact_cell_height
            ),
            (320, 180)
        );
    }

    #[test]
    fn test_frames_for_scene_respects_cap() {
        let render = RenderSettings::default();
        assert_eq!(render.frames_for_scene(10), 30);
        assert_eq!(render.frames_for_scene(2), 20);
        assert_eq!(render.frames_for_scene(0), 0);

        let uncapped = RenderSettings {
            max_frames_per_scene: u32::MAX,
            ..RenderSettings::default()
        };
        assert_eq!(uncapped.frames_for_scene(10), 100);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{ "render": { "max_frames_per_scene": 4 } }"#).unwrap();
        assert_eq!(parsed.render.max_frames_per_scene, 4);
        assert_eq!(parsed.render.fps, 10);
        assert_eq!(parsed.encoder.ffmpeg_binary, "ffmpeg");
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = AppConfig::default();
        config.render.font_path = Some(PathBuf::from("/usr/share/fonts/DejaVuSans.ttf"));
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.render, config.render);
        assert_eq!(parsed.encoder, config.encoder);
    }
}
