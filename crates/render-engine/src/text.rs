//! Overlay text: measuring, wrapping, and drawing.
//!
//! A TrueType font is used when one is configured or found in a standard
//! system location. Otherwise text is drawn with a built-in 5×7 bitmap face
//! that keeps the same advance, so panel geometry does not depend on the
//! font in use.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use storyreel_common::{StoryError, StoryResult};

/// Horizontal advance of a bitmap glyph relative to the text size.
const BITMAP_ADVANCE: f32 = 0.6;

/// Bitmap glyph cell: 5 columns plus one column of spacing, 7 rows.
const GLYPH_COLUMNS: u32 = 5;
const GLYPH_ROWS: usize = 7;

/// Fonts tried, in order, when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Text face used for overlays and character initials.
#[derive(Clone)]
pub enum TextFace {
    Font(FontArc),
    Bitmap,
}

impl std::fmt::Debug for TextFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextFace::Font(_) => f.write_str("TextFace::Font"),
            TextFace::Bitmap => f.write_str("TextFace::Bitmap"),
        }
    }
}

impl TextFace {
    /// Load a font file.
    pub fn from_file(path: &Path) -> StoryResult<Self> {
        let bytes = std::fs::read(path)?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| StoryError::config(format!("invalid font {}: {e}", path.display())))?;
        Ok(TextFace::Font(font))
    }

    /// The configured font if it loads, else the first usable system font,
    /// else the bitmap face.
    pub fn discover(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            match Self::from_file(path) {
                Ok(face) => return face,
                Err(e) => tracing::warn!(error = %e, "Configured font unusable"),
            }
        }

        for candidate in SYSTEM_FONTS.iter().map(Path::new) {
            if !candidate.is_file() {
                continue;
            }
            match Self::from_file(candidate) {
                Ok(face) => {
                    tracing::debug!(font = %candidate.display(), "Using system font");
                    return face;
                }
                Err(e) => tracing::debug!(error = %e, "Skipping system font"),
            }
        }

        tracing::info!("No TrueType font found, using built-in bitmap glyphs");
        TextFace::Bitmap
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(self, TextFace::Bitmap)
    }

    /// Rendered `(width, height)` of a single line.
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        match self {
            TextFace::Font(font) => text_size(PxScale::from(size), font, text),
            TextFace::Bitmap => {
                let chars = text.chars().count() as f32;
                ((chars * size * BITMAP_ADVANCE).round() as u32, size.round() as u32)
            }
        }
    }

    /// Draw one line with its top-left corner at `(x, y)`.
    pub fn draw(
        &self,
        image: &mut RgbaImage,
        text: &str,
        x: i32,
        y: i32,
        size: f32,
        color: Rgba<u8>,
    ) {
        match self {
            TextFace::Font(font) => {
                draw_text_mut(image, color, x, y, PxScale::from(size), font, text);
            }
            TextFace::Bitmap => draw_bitmap_line(image, text, x, y, size, color),
        }
    }

    /// Draw one line centred on `(cx, cy)`.
    pub fn draw_centered(
        &self,
        image: &mut RgbaImage,
        text: &str,
        cx: f32,
        cy: f32,
        size: f32,
        color: Rgba<u8>,
    ) {
        let (w, h) = self.measure(text, size);
        let x = (cx - w as f32 / 2.0).round() as i32;
        let y = (cy - h as f32 / 2.0).round() as i32;
        self.draw(image, text, x, y, size, color);
    }

    /// Greedy word wrap so no line exceeds `max_width`.
    ///
    /// A single word wider than `max_width` gets a line of its own.
    pub fn wrap(&self, text: &str, size: f32, max_width: u32) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if self.measure(&candidate, size).0 <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

fn draw_bitmap_line(
    image: &mut RgbaImage,
    text: &str,
    x: i32,
    y: i32,
    size: f32,
    color: Rgba<u8>,
) {
    let advance = size * BITMAP_ADVANCE;
    let cell = advance / (GLYPH_COLUMNS + 1) as f32;
    let top = y as f32 + (size - cell * GLYPH_ROWS as f32) / 2.0;

    for (i, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let gx = x as f32 + i as f32 * advance;
        for (row, bits) in glyph(ch).into_iter().enumerate() {
            for col in 0..GLYPH_COLUMNS {
                if bits & (1 << (GLYPH_COLUMNS - 1 - col)) == 0 {
                    continue;
                }
                let x0 = gx + col as f32 * cell;
                let y0 = top + row as f32 * cell;
                fill_blended(
                    image,
                    x0.round() as i64,
                    y0.round() as i64,
                    (x0 + cell).round() as i64,
                    (y0 + cell).round() as i64,
                    color,
                );
            }
        }
    }
}

/// 5×7 rows, most significant of the low five bits on the left.
/// Lowercase letters use the uppercase shapes.
fn glyph(ch: char) -> [u8; GLYPH_ROWS] {
    match ch.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
        '\'' => [0x04, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '"' => [0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        ';' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x04, 0x08],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        _ => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
    }
}

/// Alpha-blend `color` over the half-open rectangle `[x0, x1) × [y0, y1)`,
/// clipped to the image.
pub(crate) fn fill_blended(
    image: &mut RgbaImage,
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
    color: Rgba<u8>,
) {
    let (w, h) = (image.width() as i64, image.height() as i64);
    for py in y0.max(0)..y1.min(h) {
        for px in x0.max(0)..x1.min(w) {
            image.get_pixel_mut(px as u32, py as u32).blend(&color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Painted pixels of `text` drawn white on black.
    fn mask(face: &TextFace, text: &str) -> Vec<bool> {
        let mut image = RgbaImage::from_pixel(48, 32, Rgba([0, 0, 0, 255]));
        face.draw(&mut image, text, 4, 4, 24.0, Rgba([255, 255, 255, 255]));
        image.pixels().map(|p| p[0] > 128).collect()
    }

    #[test]
    fn test_bitmap_measure_scales_with_length() {
        let face = TextFace::Bitmap;
        assert_eq!(face.measure("abcde", 20.0), (60, 20));
        assert_eq!(face.measure("", 20.0), (0, 20));
    }

    #[test]
    fn test_wrap_respects_max_width() {
        let face = TextFace::Bitmap;
        let text = "the quick brown fox jumps over the lazy dog";
        let lines = face.wrap(text, 20.0, 120);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(face.measure(line, 20.0).0 <= 120 || !line.contains(' '));
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_keeps_short_text_on_one_line() {
        let lines = TextFace::Bitmap.wrap("Hello there", 20.0, 1000);
        assert_eq!(lines, ["Hello there"]);
        assert!(TextFace::Bitmap.wrap("   ", 20.0, 1000).is_empty());
    }

    #[test]
    fn test_bitmap_glyph_shape() {
        let mut image = RgbaImage::from_pixel(40, 20, Rgba([0, 0, 0, 255]));
        TextFace::Bitmap.draw(&mut image, "A", 0, 0, 20.0, Rgba([255, 255, 255, 255]));
        // Crossbar row of 'A' is solid, its top corners are empty.
        assert_eq!(image.get_pixel(6, 10), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(0, 3), &Rgba([0, 0, 0, 255]));
        assert_eq!(image.get_pixel(30, 10), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_bitmap_glyphs_are_distinct() {
        let face = TextFace::Bitmap;
        let shapes: Vec<Vec<bool>> = ["I", "O", "L", "7"].iter().map(|t| mask(&face, t)).collect();
        for (i, a) in shapes.iter().enumerate() {
            assert!(a.iter().any(|&p| p));
            for b in &shapes[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(mask(&face, "a"), mask(&face, "A"));
    }

    #[test]
    fn test_discovered_face_draws_distinct_glyphs() {
        let face = TextFace::discover(None);
        let i = mask(&face, "I");
        let o = mask(&face, "O");
        assert!(i.iter().any(|&p| p));
        assert!(o.iter().any(|&p| p));
        assert_ne!(i, o);
    }

    #[test]
    fn test_unusable_font_is_not_fatal() {
        let bad = Path::new("/nonexistent/font.ttf");
        assert!(TextFace::from_file(bad).is_err());

        let face = TextFace::discover(Some(bad));
        assert_ne!(mask(&face, "I"), mask(&face, "O"));
    }
}
