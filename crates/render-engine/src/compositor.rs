//! Frame compositor: background, characters, narration panel, and effects.
//!
//! Each frame is a pure function of the scene, its cast, and the time
//! offset, apart from decorative speckle drawn from the supplied random
//! source. Pin the source to get identical pixels.

use std::f32::consts::PI;

use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use rand::{Rng, RngCore};
use storyreel_common::{RenderSettings, StoryError, StoryResult};
use storyreel_model::{
    Background, Character, CharacterShape, Color, ResolutionPreset, Scene, VisualEffect,
};

use crate::frame::Frame;
use crate::text::TextFace;

/// Radius of a character silhouette.
pub const CHARACTER_RADIUS: f32 = 40.0;

/// Horizontal distance between the two character slots.
pub const CHARACTER_SPACING: f32 = 100.0;

/// Distance from the bottom edge to the character baseline.
pub const CHARACTER_BASELINE: f32 = 150.0;

/// Peak vertical bounce in pixels.
pub const BOUNCE_AMPLITUDE: f32 = 10.0;

pub const TEXT_SIZE: f32 = 20.0;
pub const INITIAL_SIZE: f32 = 24.0;

const PANEL_PADDING: f32 = 20.0;
const PANEL_LINE_HEIGHT: f32 = 30.0;
const PANEL_RADIUS: f32 = 10.0;
const PANEL_MAX_WIDTH_RATIO: f32 = 0.8;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const PANEL_FILL: Rgba<u8> = Rgba([255, 255, 255, 230]);
const TEXT_COLOR: Rgba<u8> = Rgba([0x33, 0x33, 0x33, 255]);
const SPARKLE: Rgba<u8> = Rgba([255, 215, 0, 178]);
const BUBBLE_STROKE: Rgba<u8> = Rgba([255, 255, 255, 128]);

/// Rasterizes scenes into frames.
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    face: TextFace,
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self::new(TextFace::discover(None))
    }
}

impl FrameRenderer {
    pub fn new(face: TextFace) -> Self {
        Self { face }
    }

    /// Renderer using the configured font, falling back to system fonts and
    /// then the bitmap face.
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self::new(TextFace::discover(settings.font_path.as_deref()))
    }

    pub fn face(&self) -> &TextFace {
        &self.face
    }

    /// Render `scene` at `time_offset_secs` into a `width`×`height` frame.
    ///
    /// Only the preset resolutions are accepted.
    pub fn render_frame(
        &self,
        scene: &Scene,
        cast: [&Character; 2],
        time_offset_secs: f32,
        width: u32,
        height: u32,
        rng: &mut dyn RngCore,
    ) -> StoryResult<Frame> {
        if ResolutionPreset::from_dimensions(width, height).is_none() {
            return Err(StoryError::unsupported_resolution(width, height));
        }

        let t = time_offset_secs;
        let mut image = draw_background(scene.background, width, height, t, rng);
        self.draw_characters(&mut image, cast, t);
        if scene.has_text() {
            self.draw_text_panel(&mut image, &scene.text);
        }
        draw_effect(&mut image, scene.visual_effect, t, rng);

        Ok(Frame::new(scene.index, time_offset_secs, image))
    }

    fn draw_characters(&self, image: &mut RgbaImage, cast: [&Character; 2], t: f32) {
        let (w, h) = (image.width() as f32, image.height() as f32);
        let bounce = (t * 2.0 * PI).sin() * BOUNCE_AMPLITUDE;

        for (slot, character) in cast.into_iter().enumerate() {
            let x = w / 2.0 + (slot as f32 - 0.5) * CHARACTER_SPACING;
            let y = h - CHARACTER_BASELINE + bounce;
            let color = rgba(character.color);

            match character.shape {
                CharacterShape::Round => {
                    draw_filled_circle_mut(
                        image,
                        (x.round() as i32, y.round() as i32),
                        CHARACTER_RADIUS as i32,
                        color,
                    );
                }
                CharacterShape::Rectangular => {
                    let left = x - CHARACTER_RADIUS + bounce / 2.0;
                    let top = y - CHARACTER_RADIUS;
                    let side = CHARACTER_RADIUS * 2.0;
                    fill_rounded_rect(image, left, top, side, side, 12.0, color);
                }
                CharacterShape::Star => {
                    draw_polygon_mut(image, &star_points(x, y, CHARACTER_RADIUS), color);
                }
            }

            if let Some(initial) = character.initial() {
                self.face.draw_centered(
                    image,
                    &initial.to_string(),
                    x,
                    y,
                    INITIAL_SIZE,
                    WHITE,
                );
            }
        }
    }

    fn draw_text_panel(&self, image: &mut RgbaImage, text: &str) {
        let (w, h) = (image.width() as f32, image.height() as f32);
        let max_line = (w * PANEL_MAX_WIDTH_RATIO) as u32;
        let lines = self.face.wrap(text, TEXT_SIZE, max_line);
        if lines.is_empty() {
            return;
        }

        let widest = lines
            .iter()
            .map(|line| self.face.measure(line, TEXT_SIZE).0)
            .max()
            .unwrap_or(0) as f32;
        let panel_w = widest + PANEL_PADDING * 2.0;
        let panel_h = PANEL_LINE_HEIGHT * (lines.len() as f32 + 1.0);
        let left = (w - panel_w) / 2.0;
        let top = h / 2.0 - panel_h / 2.0;

        fill_rounded_rect(image, left, top, panel_w, panel_h, PANEL_RADIUS, PANEL_FILL);

        let first_center = top + PANEL_LINE_HEIGHT;
        for (i, line) in lines.iter().enumerate() {
            let cy = first_center + i as f32 * PANEL_LINE_HEIGHT;
            self.face
                .draw_centered(image, line, w / 2.0, cy, TEXT_SIZE, TEXT_COLOR);
        }
    }
}

/// Gradient endpoints (top, bottom) for each background.
pub fn gradient_stops(background: Background) -> (Color, Color) {
    match background {
        Background::Meadow => (Color::rgb(0x87, 0xCE, 0xEB), Color::rgb(0x98, 0xFB, 0x98)),
        Background::Forest => (Color::rgb(0x93, 0x70, 0xDB), Color::rgb(0x22, 0x8B, 0x22)),
        Background::NightSky => (Color::rgb(0x19, 0x19, 0x70), Color::rgb(0x00, 0x00, 0x80)),
        Background::Underwater => (Color::rgb(0x60, 0xA5, 0xFA), Color::rgb(0x0D, 0x94, 0x88)),
        Background::RainbowSky => (Color::rgb(0xBF, 0xDB, 0xFE), Color::rgb(0xFB, 0xCF, 0xE8)),
        Background::Village => (Color::rgb(0xFE, 0xD7, 0xAA), Color::rgb(0xFE, 0xF0, 0x8A)),
    }
}

fn draw_background(
    background: Background,
    width: u32,
    height: u32,
    t: f32,
    rng: &mut dyn RngCore,
) -> RgbaImage {
    let (top, bottom) = gradient_stops(background);
    let span = (height.max(2) - 1) as f32;
    let mut image =
        RgbaImage::from_fn(width, height, |_, y| lerp_color(top, bottom, y as f32 / span));

    let (w, h) = (width as f32, height as f32);
    match background {
        Background::Meadow => {
            let petal = rgba(Color::rgb(0xFF, 0xB6, 0xC1));
            for i in 0..5 {
                let x = w / 6.0 * (i + 1) as f32;
                draw_filled_circle_mut(&mut image, (x as i32, (h - 50.0) as i32), 15, petal);
            }
        }
        Background::Forest => {
            let glow = rgba(Color::rgb(0x90, 0xEE, 0x90));
            for i in 0..4 {
                let x = w / 5.0 * (i + 1) as f32;
                let rect = Rect::at((x - 20.0) as i32, (h - 200.0) as i32).of_size(40, 150);
                draw_filled_rect_mut(&mut image, rect, glow);
            }
        }
        Background::NightSky => {
            let moon = rgba(Color::rgb(0xF0, 0xE6, 0x8C));
            draw_filled_circle_mut(&mut image, ((w - 100.0) as i32, 100), 40, moon);
            for _ in 0..20 {
                let x = rng.random_range(0..width);
                let y = rng.random_range(0..(height / 2).max(1));
                draw_filled_circle_mut(&mut image, (x as i32, y as i32), 2, WHITE);
            }
        }
        Background::Underwater => {
            let ring = Rgba([255, 255, 255, 100]);
            for i in 0..8 {
                let x = w / 9.0 * (i + 1) as f32;
                let y = h - (t * 60.0 + i as f32 * 90.0) % h;
                let r = 8.0 + (i % 3) as f32 * 4.0;
                stroke_ring(&mut image, x, y, r, 2.0, ring);
            }
        }
        Background::RainbowSky => {
            let bands = [
                Color::rgb(0xFF, 0x45, 0x45),
                Color::rgb(0xFF, 0xA5, 0x00),
                Color::rgb(0xFF, 0xE6, 0x6D),
                Color::rgb(0x7C, 0xD9, 0x7C),
                Color::rgb(0x5D, 0xA9, 0xE9),
                Color::rgb(0x9B, 0x6B, 0xD6),
            ];
            let band = 18.0;
            let outer = h * 0.55;
            for (i, color) in bands.into_iter().enumerate() {
                let r = outer - band * (i as f32 + 0.5);
                stroke_ring(&mut image, w / 2.0, h, r, band, rgba(color));
            }
            for (cx, cy) in [(w * 0.2, h * 0.18), (w * 0.75, h * 0.12)] {
                for (dx, r) in [(-35.0, 28), (0.0, 38), (35.0, 28)] {
                    draw_filled_circle_mut(&mut image, ((cx + dx) as i32, cy as i32), r, WHITE);
                }
            }
        }
        Background::Village => {
            let wall = rgba(Color::rgb(0xE0, 0x7A, 0x5F));
            let roof = rgba(Color::rgb(0x8B, 0x45, 0x13));
            let ground = h - 60.0;
            for i in 0..4 {
                let x = w / 5.0 * (i + 1) as f32;
                let body = Rect::at((x - 60.0) as i32, (ground - 90.0) as i32).of_size(120, 90);
                draw_filled_rect_mut(&mut image, body, wall);
                let peak = [
                    Point::new((x - 75.0) as i32, (ground - 90.0) as i32),
                    Point::new(x as i32, (ground - 150.0) as i32),
                    Point::new((x + 75.0) as i32, (ground - 90.0) as i32),
                ];
                draw_polygon_mut(&mut image, &peak, roof);
            }
        }
    }

    image
}

fn draw_effect(image: &mut RgbaImage, effect: VisualEffect, t: f32, rng: &mut dyn RngCore) {
    let (width, height) = image.dimensions();
    match effect {
        VisualEffect::Sparkles => {
            for _ in 0..10 {
                let x = rng.random_range(0..width) as f32;
                let y = rng.random_range(0..height) as f32;
                let size = rng.random_range(1.0..4.0f32);
                fill_disc(image, x, y, size, SPARKLE);
            }
        }
        VisualEffect::Bubbles => {
            let h = height as f32;
            for i in 0..5 {
                let x = rng.random_range(0..width) as f32;
                let y = h - (t * 100.0 + i as f32 * 50.0) % h;
                let r = rng.random_range(10.0..20.0f32);
                stroke_ring(image, x, y, r, 2.0, BUBBLE_STROKE);
            }
        }
        VisualEffect::FloatingParticles
        | VisualEffect::GentleWind
        | VisualEffect::StarTwinkles
        | VisualEffect::Confetti => {}
    }
}

/// Vertices of a five-pointed star with inner radius `radius / 2`.
fn star_points(cx: f32, cy: f32, radius: f32) -> Vec<Point<i32>> {
    (0..10)
        .map(|i| {
            let angle = i as f32 * PI / 5.0 - PI / 2.0;
            let r = if i % 2 == 0 { radius } else { radius / 2.0 };
            Point::new(
                (cx + angle.cos() * r).round() as i32,
                (cy + angle.sin() * r).round() as i32,
            )
        })
        .collect()
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba(color.to_rgba())
}

fn lerp_color(a: Color, b: Color, t: f32) -> Rgba<u8> {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Rgba([mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), 255])
}

/// Pixel bounds of a box, clipped to the image.
fn clip(image: &RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32) -> (u32, u32, u32, u32) {
    let (w, h) = (image.width() as f32, image.height() as f32);
    (
        x0.floor().clamp(0.0, w) as u32,
        y0.floor().clamp(0.0, h) as u32,
        x1.ceil().clamp(0.0, w) as u32,
        y1.ceil().clamp(0.0, h) as u32,
    )
}

/// Whether `(lx, ly)` lies inside a `w`×`h` rectangle with corner radius `r`.
fn inside_rounded_rect(lx: f32, ly: f32, w: f32, h: f32, r: f32) -> bool {
    if lx < 0.0 || ly < 0.0 || lx > w || ly > h {
        return false;
    }
    let r = r.min(w / 2.0).min(h / 2.0);
    let cx = lx.clamp(r, w - r);
    let cy = ly.clamp(r, h - r);
    (lx - cx).powi(2) + (ly - cy).powi(2) <= r * r
}

fn fill_rounded_rect(
    image: &mut RgbaImage,
    left: f32,
    top: f32,
    w: f32,
    h: f32,
    radius: f32,
    color: Rgba<u8>,
) {
    let (x0, y0, x1, y1) = clip(image, left, top, left + w, top + h);
    for py in y0..y1 {
        for px in x0..x1 {
            let lx = px as f32 + 0.5 - left;
            let ly = py as f32 + 0.5 - top;
            if inside_rounded_rect(lx, ly, w, h, radius) {
                image.get_pixel_mut(px, py).blend(&color);
            }
        }
    }
}

fn fill_disc(image: &mut RgbaImage, cx: f32, cy: f32, r: f32, color: Rgba<u8>) {
    let (x0, y0, x1, y1) = clip(image, cx - r, cy - r, cx + r, cy + r);
    for py in y0..y1 {
        for px in x0..x1 {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r * r {
                image.get_pixel_mut(px, py).blend(&color);
            }
        }
    }
}

/// Blend an annulus of the given stroke width centred on radius `r`.
fn stroke_ring(image: &mut RgbaImage, cx: f32, cy: f32, r: f32, width: f32, color: Rgba<u8>) {
    let outer = r + width / 2.0;
    let inner = (r - width / 2.0).max(0.0);
    let (x0, y0, x1, y1) = clip(image, cx - outer, cy - outer, cx + outer, cy + outer);
    for py in y0..y1 {
        for px in x0..x1 {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            let d2 = dx * dx + dy * dy;
            if d2 <= outer * outer && d2 >= inner * inner {
                image.get_pixel_mut(px, py).blend(&color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use storyreel_model::default_roster;

    fn scene(text: &str, background: Background, effect: VisualEffect) -> Scene {
        Scene {
            index: 0,
            duration_secs: 10,
            text: text.to_string(),
            background,
            character_pair: [0, 1],
            action: "waving hands happily".to_string(),
            transition: "fade to black".to_string(),
            visual_effect: effect,
            sound_effect: "happy chimes".to_string(),
        }
    }

    fn render(scene: &Scene, t: f32, seed: u64) -> StoryResult<Frame> {
        let roster = default_roster();
        let mut rng = StdRng::seed_from_u64(seed);
        FrameRenderer::new(TextFace::Bitmap).render_frame(
            scene,
            [&roster[0], &roster[1]],
            t,
            1280,
            720,
            &mut rng,
        )
    }

    #[test]
    fn test_rejects_non_preset_resolution() {
        let roster = default_roster();
        let mut rng = StdRng::seed_from_u64(1);
        let err = FrameRenderer::new(TextFace::Bitmap)
            .render_frame(
                &scene("Hi", Background::Meadow, VisualEffect::Confetti),
                [&roster[0], &roster[1]],
                0.0,
                640,
                480,
                &mut rng,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StoryError::UnsupportedResolution {
                width: 640,
                height: 480
            }
        ));
    }

    #[test]
    fn test_frame_is_tagged_and_sized() {
        let board = scene("Hi", Background::Forest, VisualEffect::GentleWind);
        let frame = render(&board, 1.5, 1).unwrap();
        assert_eq!(frame.dimensions(), (1280, 720));
        assert_eq!(frame.scene_index, 0);
        assert!((frame.time_offset_secs - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_text_draws_no_panel() {
        let at = |text: &str| {
            render(&scene(text, Background::Meadow, VisualEffect::Confetti), 0.0, 1).unwrap()
        };
        let blank = at("");
        let whitespace = at("   ");
        let texted = at("Hello");

        // Just inside the left padding of a one-line panel.
        let edge = (640 - 50, 360);
        let gradient = blank.image.get_pixel(edge.0, edge.1);
        assert!(gradient[0] < 200, "expected sky gradient, got {gradient:?}");
        assert_eq!(blank.image, whitespace.image);

        let panel = texted.image.get_pixel(edge.0, edge.1);
        assert!(
            panel.0[..3].iter().all(|&c| c >= 230),
            "expected panel, got {panel:?}"
        );
    }

    #[test]
    fn test_characters_drawn_in_accent_color() {
        let board = scene("", Background::Meadow, VisualEffect::Confetti);
        let frame = render(&board, 0.0, 1).unwrap();
        // Above the initial, inside Luna's circle.
        assert_eq!(
            frame.image.get_pixel(590, 540),
            &Rgba([0xFF, 0x6B, 0x9D, 255])
        );
        // Inside Ziggy's square.
        assert_eq!(
            frame.image.get_pixel(690, 540),
            &Rgba([0x4E, 0xCD, 0xC4, 255])
        );
    }

    #[test]
    fn test_default_renderer_draws_readable_text() {
        let renderer = FrameRenderer::default();
        let draw = |text: &str| {
            let mut image = RgbaImage::from_pixel(64, 48, Rgba([0, 0, 0, 255]));
            renderer.face().draw(&mut image, text, 8, 8, 32.0, WHITE);
            image
        };
        let (i, o) = (draw("I"), draw("O"));
        assert_ne!(i, o);
        // Glyphs leave interior gaps instead of filling their cell.
        let painted = |img: &RgbaImage| img.pixels().filter(|p| p[0] > 128).count();
        let cell = (renderer.face().measure("O", 32.0).0 * 32) as usize;
        assert!(painted(&o) > 0 && painted(&o) < cell / 2, "{}", painted(&o));
    }

    #[test]
    fn test_pinned_rng_reproduces_pixels() {
        let board = scene("Twinkle", Background::NightSky, VisualEffect::Sparkles);
        let a = render(&board, 0.3, 42).unwrap();
        let b = render(&board, 0.3, 42).unwrap();
        assert_eq!(a.image, b.image);
    }

    #[test]
    fn test_every_background_renders() {
        for background in Background::ALL {
            let frame = render(&scene("x", background, VisualEffect::Bubbles), 2.0, 3).unwrap();
            let (top, _) = gradient_stops(background);
            // Top-left corner is untouched gradient for every preset.
            let corner = frame.image.get_pixel(0, 0);
            assert_eq!(corner.0[..3], [top.r, top.g, top.b], "{background:?}");
        }
    }

    #[test]
    fn test_long_text_wraps_inside_frame() {
        let long = "word ".repeat(120);
        let board = scene(&long, Background::Meadow, VisualEffect::Confetti);
        let frame = render(&board, 0.0, 1).unwrap();
        // Frame edges stay clear of the panel.
        let edge = frame.image.get_pixel(10, 360);
        assert!(edge[0] < 200);
    }

    #[test]
    fn test_star_has_ten_vertices() {
        let points = star_points(100.0, 100.0, 40.0);
        assert_eq!(points.len(), 10);
        assert_eq!(points[0], Point::new(100, 60));
        assert_ne!(points.first(), points.last());
    }

    #[test]
    fn test_rounded_rect_corners() {
        assert!(inside_rounded_rect(50.0, 25.0, 100.0, 50.0, 10.0));
        assert!(!inside_rounded_rect(0.5, 0.5, 100.0, 50.0, 10.0));
        assert!(!inside_rounded_rect(-1.0, 25.0, 100.0, 50.0, 10.0));
    }
}
