//! Characters and their accent colors.

use serde::{Deserialize, Serialize};

/// An sRGB accent color, serialized as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorParseError {
                input: hex.to_string(),
            });
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| ColorParseError {
                input: hex.to_string(),
            })
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Opaque RGBA channels.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid color '{input}', expected #RRGGBB")]
pub struct ColorParseError {
    pub input: String,
}

/// Silhouette a character is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterShape {
    /// Filled circle.
    Round,
    /// Rounded rectangle.
    Rectangular,
    /// Five-pointed star polygon.
    Star,
}

/// A reusable cast member. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub color: Color,
    pub shape: CharacterShape,
    /// Display-only tag.
    pub personality: String,
}

impl Character {
    pub fn new(
        name: impl Into<String>,
        color: Color,
        shape: CharacterShape,
        personality: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            color,
            shape,
            personality: personality.into(),
        }
    }

    /// First character of the name, drawn on top of the shape.
    pub fn initial(&self) -> Option<char> {
        self.name.chars().next()
    }
}

/// The fixed three-character roster every storyboard uses.
pub fn default_roster() -> Vec<Character> {
    vec![
        Character::new(
            "Luna",
            Color::rgb(0xFF, 0x6B, 0x9D),
            CharacterShape::Round,
            "curious",
        ),
        Character::new(
            "Ziggy",
            Color::rgb(0x4E, 0xCD, 0xC4),
            CharacterShape::Rectangular,
            "energetic",
        ),
        Character::new(
            "Spark",
            Color::rgb(0xFF, 0xE6, 0x6D),
            CharacterShape::Star,
            "wise",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_roundtrip() {
        let color = Color::from_hex("#ff6b9d").unwrap();
        assert_eq!(color, Color::rgb(0xFF, 0x6B, 0x9D));
        assert_eq!(color.to_hex(), "#FF6B9D");
        assert_eq!(Color::from_hex("4ECDC4").unwrap(), Color::rgb(0x4E, 0xCD, 0xC4));
    }

    #[test]
    fn test_color_rejects_malformed_hex() {
        assert!(Color::from_hex("#FFF").is_err());
        assert!(Color::from_hex("#GG0000").is_err());
        assert!(Color::from_hex("#ÿÿÿ").is_err());
    }

    #[test]
    fn test_color_serializes_as_hex_string() {
        let json = serde_json::to_string(&Color::rgb(0xFF, 0xE6, 0x6D)).unwrap();
        assert_eq!(json, "\"#FFE66D\"");
        let parsed: Color = serde_json::from_str("\"#FFE66D\"").unwrap();
        assert_eq!(parsed, Color::rgb(0xFF, 0xE6, 0x6D));
        assert!(serde_json::from_str::<Color>("\"pink\"").is_err());
    }

    #[test]
    fn test_default_roster() {
        let roster = default_roster();
        assert_eq!(roster.len(), 3);
        let names: Vec<_> = roster.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Luna", "Ziggy", "Spark"]);
        assert_eq!(roster[2].shape, CharacterShape::Star);
        assert_eq!(roster[1].initial(), Some('Z'));
    }
}
