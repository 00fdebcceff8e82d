//! Scenes and their cosmetic attributes.

use serde::{Deserialize, Serialize};

/// Length of every scene, in seconds.
pub const SCENE_DURATION_SECS: u32 = 10;

/// Named background presets.
///
/// Serialized by label. Labels that do not match a preset deserialize to
/// [`Background::Meadow`] so a hand-edited storyboard can always be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Background {
    Meadow,
    Forest,
    NightSky,
    Underwater,
    RainbowSky,
    Village,
}

impl Background {
    pub const ALL: [Background; 6] = [
        Background::Meadow,
        Background::Forest,
        Background::NightSky,
        Background::Underwater,
        Background::RainbowSky,
        Background::Village,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Background::Meadow => "sunny meadow with colorful flowers",
            Background::Forest => "magical forest with glowing trees",
            Background::NightSky => "starry night sky with moon",
            Background::Underwater => "underwater world with bubbles",
            Background::RainbowSky => "cloudy sky with rainbow",
            Background::Village => "cozy village with houses",
        }
    }

    /// Look up a preset by label, falling back to the first preset.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|bg| bg.label().eq_ignore_ascii_case(label.trim()))
            .unwrap_or(Background::Meadow)
    }
}

impl From<String> for Background {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<Background> for String {
    fn from(bg: Background) -> Self {
        bg.label().to_string()
    }
}

/// Visual effect presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualEffect {
    #[serde(rename = "floating particles")]
    FloatingParticles,
    #[serde(rename = "sparkles and glows")]
    Sparkles,
    #[serde(rename = "gentle wind effects")]
    GentleWind,
    #[serde(rename = "bubble animations")]
    Bubbles,
    #[serde(rename = "star twinkles")]
    StarTwinkles,
    #[serde(rename = "confetti celebration")]
    Confetti,
}

impl VisualEffect {
    pub const ALL: [VisualEffect; 6] = [
        VisualEffect::FloatingParticles,
        VisualEffect::Sparkles,
        VisualEffect::GentleWind,
        VisualEffect::Bubbles,
        VisualEffect::StarTwinkles,
        VisualEffect::Confetti,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VisualEffect::FloatingParticles => "floating particles",
            VisualEffect::Sparkles => "sparkles and glows",
            VisualEffect::GentleWind => "gentle wind effects",
            VisualEffect::Bubbles => "bubble animations",
            VisualEffect::StarTwinkles => "star twinkles",
            VisualEffect::Confetti => "confetti celebration",
        }
    }
}

/// One fixed-duration segment of a storyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Position in the storyboard (0-based).
    pub index: usize,

    /// Scene length in seconds.
    pub duration_secs: u32,

    /// Narration slice for this scene. May be empty.
    pub text: String,

    pub background: Background,

    /// Indices into the storyboard roster. The scene never owns characters.
    pub character_pair: [usize; 2],

    /// Character action description (metadata only).
    pub action: String,

    /// Transition into the next scene (metadata only).
    pub transition: String,

    pub visual_effect: VisualEffect,

    /// Sound-effect label. Never rendered to audio.
    pub sound_effect: String,
}

impl Scene {
    /// Whether the scene carries narration to overlay.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_label_roundtrip() {
        for bg in Background::ALL {
            assert_eq!(Background::from_label(bg.label()), bg);
        }
    }

    #[test]
    fn test_unknown_background_falls_back_to_first_preset() {
        assert_eq!(Background::from_label("volcano at dusk"), Background::Meadow);
        let parsed: Background = serde_json::from_str("\"volcano at dusk\"").unwrap();
        assert_eq!(parsed, Background::ALL[0]);
    }

    #[test]
    fn test_visual_effect_serializes_by_label() {
        for effect in VisualEffect::ALL {
            let json = serde_json::to_string(&effect).unwrap();
            assert_eq!(json, format!("\"{}\"", effect.label()));
        }
    }
}
