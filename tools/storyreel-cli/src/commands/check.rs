//! Check encoder and text face availability.

use storyreel_common::AppConfig;
use storyreel_render_engine::{CaptureBackend, FfmpegCapture, FrameRenderer};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("StoryReel System Check");
    println!("{}", "=".repeat(50));

    println!("[OK] Frame sequence (GIF): built in");
    println!("[OK] Contact sheet (PNG): built in");

    let capture = FfmpegCapture::new(config.encoder.ffmpeg_binary.clone());
    if capture.is_available() {
        println!("[OK] Streaming container (WebM): {}", capture.binary());
    } else {
        println!(
            "[WARN] Streaming container (WebM): '{}' not found",
            capture.binary()
        );
        println!("       Video exports will fall back to a contact sheet.");
    }

    let renderer = FrameRenderer::from_settings(&config.render);
    if renderer.face().is_bitmap() {
        println!("[WARN] Overlay text: built-in bitmap glyphs (no TrueType font found)");
        println!("       Set render.font_path in the config for smoother text.");
    } else {
        println!("[OK] Overlay text: TrueType font");
    }

    println!();
    println!("Config file: {}", storyreel_common::config::config_file_path().display());
    println!("Output dir:  {}", config.output_dir.display());

    Ok(())
}
