//! Export configuration and the artifact an export produces.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// Looping animated image (GIF): light and widely shareable.
    FrameSequence,
    /// Real-time captured video container (WebM): universal playback.
    StreamingContainer,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::FrameSequence => "frame-sequence",
            ExportFormat::StreamingContainer => "streaming-container",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ParseExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frame-sequence" | "gif" => Ok(ExportFormat::FrameSequence),
            "streaming-container" | "webm" | "video" => Ok(ExportFormat::StreamingContainer),
            _ => Err(ParseExportError::new(
                "format",
                s,
                "frame-sequence (gif), streaming-container (webm)",
            )),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported output resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionPreset {
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "720p")]
    Hd720,
}

impl ResolutionPreset {
    pub const ALL: [ResolutionPreset; 2] = [ResolutionPreset::Hd1080, ResolutionPreset::Hd720];

    /// Pixel width and height.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            ResolutionPreset::Hd1080 => (1920, 1080),
            ResolutionPreset::Hd720 => (1280, 720),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResolutionPreset::Hd1080 => "1080p",
            ResolutionPreset::Hd720 => "720p",
        }
    }

    /// The preset with exactly these dimensions, if any.
    pub fn from_dimensions(width: u32, height: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.dimensions() == (width, height))
    }
}

impl FromStr for ResolutionPreset {
    type Err = ParseExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1080p" | "1920x1080" => Ok(ResolutionPreset::Hd1080),
            "720p" | "1280x720" => Ok(ResolutionPreset::Hd720),
            _ => Err(ParseExportError::new("resolution", s, "1080p, 720p")),
        }
    }
}

impl fmt::Display for ResolutionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Quality tier. Only the streaming container honours it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    High,
    Medium,
    Low,
}

impl QualityTier {
    /// Target video bitrate in bits per second.
    pub fn bitrate_bps(self) -> u32 {
        match self {
            QualityTier::High => 2_000_000,
            QualityTier::Medium => 1_000_000,
            QualityTier::Low => 500_000,
        }
    }
}

impl FromStr for QualityTier {
    type Err = ParseExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(QualityTier::High),
            "medium" => Ok(QualityTier::Medium),
            "low" => Ok(QualityTier::Low),
            _ => Err(ParseExportError::new("quality", s, "high, medium, low")),
        }
    }
}

/// Error returned when parsing an export option from text.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {field} '{value}', expected one of: {expected}")]
pub struct ParseExportError {
    pub field: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl ParseExportError {
    fn new(field: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            field,
            value: value.to_string(),
            expected,
        }
    }
}

/// Export configuration supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    pub format: ExportFormat,
    pub resolution: ResolutionPreset,
    pub quality: QualityTier,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::StreamingContainer,
            resolution: ResolutionPreset::Hd1080,
            quality: QualityTier::High,
        }
    }
}

/// Media type of an encoded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "image/gif")]
    Gif,
    #[serde(rename = "video/webm")]
    Webm,
    #[serde(rename = "image/png")]
    Png,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Gif => "image/gif",
            MediaType::Webm => "video/webm",
            MediaType::Png => "image/png",
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            MediaType::Gif => "gif",
            MediaType::Webm => "webm",
            MediaType::Png => "png",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final encoded bytes. The media type reflects the strategy that actually
/// produced them, which may differ from the requested format.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

impl Artifact {
    pub fn new(bytes: Vec<u8>, media_type: MediaType) -> Self {
        Self { bytes, media_type }
    }

    pub fn extension(&self) -> &'static str {
        self.media_type.extension()
    }

    /// `storyboard-<unix millis>.<ext>`
    pub fn suggested_filename(&self) -> String {
        format!(
            "storyboard-{}.{}",
            chrono::Utc::now().timestamp_millis(),
            self.extension()
        )
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("media_type", &self.media_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_presets() {
        assert_eq!(ResolutionPreset::Hd1080.dimensions(), (1920, 1080));
        assert_eq!(ResolutionPreset::Hd720.dimensions(), (1280, 720));
        assert_eq!(
            ResolutionPreset::from_dimensions(1280, 720),
            Some(ResolutionPreset::Hd720)
        );
        assert_eq!(ResolutionPreset::from_dimensions(640, 480), None);
    }

    #[test]
    fn test_quality_bitrate_decreases() {
        assert!(QualityTier::High.bitrate_bps() > QualityTier::Medium.bitrate_bps());
        assert!(QualityTier::Medium.bitrate_bps() > QualityTier::Low.bitrate_bps());
    }

    #[test]
    fn test_parse_export_options() {
        assert_eq!("gif".parse::<ExportFormat>().unwrap(), ExportFormat::FrameSequence);
        assert_eq!(
            "streaming-container".parse::<ExportFormat>().unwrap(),
            ExportFormat::StreamingContainer
        );
        assert_eq!("720P".parse::<ResolutionPreset>().unwrap(), ResolutionPreset::Hd720);
        assert_eq!("low".parse::<QualityTier>().unwrap(), QualityTier::Low);

        let err = "mp5".parse::<ExportFormat>().unwrap_err();
        assert!(err.to_string().contains("unknown format 'mp5'"));
    }

    #[test]
    fn test_export_config_serialization() {
        let config = ExportConfig {
            format: ExportFormat::FrameSequence,
            resolution: ResolutionPreset::Hd720,
            quality: QualityTier::Medium,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(
            json,
            r#"{"format":"frame-sequence","resolution":"720p","quality":"medium"}"#
        );
        let parsed: ExportConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_artifact_naming_follows_media_type() {
        let artifact = Artifact::new(vec![1, 2, 3], MediaType::Png);
        assert_eq!(artifact.extension(), "png");
        let name = artifact.suggested_filename();
        assert!(name.starts_with("storyboard-"));
        assert!(name.ends_with(".png"));
        assert_eq!(format!("{artifact:?}"), "Artifact { media_type: Png, bytes: 3 }");
    }
}
