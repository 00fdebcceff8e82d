//! Plan and export a storyboard.

use std::io::Write;
use std::path::PathBuf;

use storyreel_common::{AppConfig, CancelToken};
use storyreel_model::{ExportConfig, ExportFormat};
use storyreel_planner::PlanOptions;
use storyreel_render_engine::{CaptureBackend, ExportPhase, ExportProgress, Exporter};

/// Narration shorter than this still plans, but rarely fills six scenes.
const RECOMMENDED_NARRATION_CHARS: usize = 50;

pub async fn run(
    path: PathBuf,
    export: ExportConfig,
    config: AppConfig,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let narration = super::read_narration(&path)?;
    let length = narration.trim().chars().count();
    if length < RECOMMENDED_NARRATION_CHARS {
        println!(
            "Warning: narration is {length} characters; at least \
             {RECOMMENDED_NARRATION_CHARS} give better results."
        );
    }

    let options = PlanOptions {
        resolution: export.resolution,
        ..PlanOptions::default()
    };
    let storyboard = storyreel_planner::plan_with(&narration, &options)?;

    println!("Exporting storyboard from: {}", path.display());
    println!("  Scenes: {}", storyboard.scenes.len());
    println!("  Format: {}", export.format);
    println!("  Resolution: {}", export.resolution);
    println!("  Quality: {:?}", export.quality);
    println!("  Output dir: {}", config.output_dir.display());

    let progress_cb: Box<dyn Fn(ExportProgress) + Send + Sync> = Box::new(|p| {
        if !matches!(p.phase, ExportPhase::Failed { .. }) {
            print!("\r  Progress: {:>3}% {:<40}", p.percent, p.message);
            std::io::stdout().flush().ok();
        }
    });

    let mut exporter = Exporter::new(&config).with_progress(progress_cb);
    if let Some(seed) = seed {
        exporter = exporter.with_seed(seed);
    }

    let capture = exporter.encoder().capture_backend();
    if export.format == ExportFormat::StreamingContainer && !capture.is_available() {
        println!(
            "Warning: {} is not available; the export will fall back to a contact sheet.",
            capture.name()
        );
    }

    let cancel = CancelToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let result = exporter.run_export(&storyboard, &export, &cancel).await;
    ctrl_c.abort();

    match result {
        Ok(artifact) => {
            let job = exporter.job();
            println!();
            if let Some(fallback) = &job.fallback {
                println!(
                    "Note: {} failed ({}); exported a contact sheet instead.",
                    fallback.from, fallback.reason
                );
            }
            match &job.delivered_to {
                Some(path) => println!("Export complete: {}", path.display()),
                None => println!("Export complete: {} bytes", artifact.len()),
            }
            println!("  Type: {}", artifact.media_type);
            Ok(())
        }
        Err(e) => {
            println!();
            Err(anyhow::anyhow!("Export failed: {e}"))
        }
    }
}
