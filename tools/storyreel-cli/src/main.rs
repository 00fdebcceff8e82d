//! StoryReel CLI: plan and export narrated storyboards.
//!
//! Usage:
//!   storyreel plan <FILE>      Print the planned storyboard as JSON
//!   storyreel export <FILE>    Render and encode a storyboard
//!   storyreel check            Check encoder availability

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use storyreel_model::{ExportFormat, QualityTier, ResolutionPreset};

mod commands;

#[derive(Parser)]
#[command(
    name = "storyreel",
    about = "Turn a short narration into an animated storyboard",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a storyboard from a narration file and print it as JSON
    Plan {
        /// Narration text file ("-" reads stdin)
        path: PathBuf,

        /// Storyboard title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Plan, render, and encode a storyboard
    Export {
        /// Narration text file ("-" reads stdin)
        path: PathBuf,

        /// Output format: frame-sequence (gif) or streaming-container (webm)
        #[arg(long, default_value = "streaming-container")]
        format: ExportFormat,

        /// Output resolution: 1080p or 720p
        #[arg(long, default_value = "1080p")]
        resolution: ResolutionPreset,

        /// Quality tier: high, medium, or low
        #[arg(long, default_value = "high")]
        quality: QualityTier,

        /// Directory the artifact is written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Seed for decorative randomness
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Check encoder availability
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = storyreel_common::AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    storyreel_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Plan { path, title } => commands::plan::run(path, title),
        Commands::Export {
            path,
            format,
            resolution,
            quality,
            output_dir,
            seed,
        } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            let export = storyreel_model::ExportConfig {
                format,
                resolution,
                quality,
            };
            commands::export::run(path, export, config, seed).await
        }
        Commands::Check => commands::check::run(&config),
    }
}
