//! Export orchestration and job management.

use std::path::PathBuf;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use storyreel_common::{AppConfig, CancelToken, FrameClock, RenderSettings, StoryError, StoryResult};
use storyreel_model::{Artifact, ExportConfig, Storyboard};

use crate::compositor::FrameRenderer;
use crate::delivery::{ArtifactDelivery, DirectoryDelivery};
use crate::encode::streaming::CaptureBackend;
use crate::encode::{EncoderPipeline, EncodingStrategy, FallbackRecord};
use crate::frame::FrameSequence;

/// Progress band the encoder's 0–100 milestones are mapped into.
const ENCODE_BAND: (u8, u8) = (60, 95);

/// Stages of the export process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ExportPhase {
    Idle,
    Initializing,
    GeneratingFrames,
    Encoding,
    Finalizing,
    Complete,
    Failed { reason: String },
}

impl ExportPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportPhase::Complete | ExportPhase::Failed { .. })
    }
}

/// Export progress report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportProgress {
    /// Overall progress [0, 100]. Never decreases within a job.
    pub percent: u8,

    /// Human-readable status.
    pub message: String,

    /// Current stage.
    pub phase: ExportPhase,
}

/// Progress callback for export runs.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

/// State of the current (or last) export attempt.
#[derive(Debug, Clone, Serialize)]
pub struct ExportJob {
    pub phase: ExportPhase,
    pub progress_percent: u8,
    pub status_message: String,

    /// Strategy that produced the artifact, once encoding finished.
    pub strategy: Option<EncodingStrategy>,

    pub fallback: Option<FallbackRecord>,

    /// Where the artifact was delivered, if a delivery target is set.
    pub delivered_to: Option<PathBuf>,
}

impl Default for ExportJob {
    fn default() -> Self {
        Self {
            phase: ExportPhase::Idle,
            progress_percent: 0,
            status_message: String::new(),
            strategy: None,
            fallback: None,
            delivered_to: None,
        }
    }
}

/// Job state plus the observer it reports to.
struct JobTracker {
    job: Mutex<ExportJob>,
    callback: Option<ProgressCallback>,
}

impl JobTracker {
    fn snapshot(&self) -> ExportJob {
        self.job.lock().map(|job| job.clone()).unwrap_or_default()
    }

    fn reset(&self) {
        if let Ok(mut job) = self.job.lock() {
            *job = ExportJob::default();
        }
    }

    fn update(&self, phase: ExportPhase, percent: u8, message: &str) {
        let progress = {
            let Ok(mut job) = self.job.lock() else {
                return;
            };
            job.phase = phase;
            job.progress_percent = job.progress_percent.max(percent.min(100));
            job.status_message = message.to_string();
            ExportProgress {
                percent: job.progress_percent,
                message: job.status_message.clone(),
                phase: job.phase.clone(),
            }
        };
        tracing::debug!(
            percent = progress.percent,
            phase = ?progress.phase,
            "{}",
            progress.message
        );
        if let Some(cb) = &self.callback {
            cb(progress);
        }
    }

    fn record_strategy(&self, strategy: EncodingStrategy, fallback: Option<FallbackRecord>) {
        if let Ok(mut job) = self.job.lock() {
            job.strategy = Some(strategy);
            job.fallback = fallback;
        }
    }

    fn record_delivery(&self, path: PathBuf) {
        if let Ok(mut job) = self.job.lock() {
            job.delivered_to = Some(path);
        }
    }

    fn fail(&self, err: &StoryError) {
        let percent = self.snapshot().progress_percent;
        let reason = err.to_string();
        tracing::error!(error = %err, percent, "Export failed");
        self.update(
            ExportPhase::Failed {
                reason: reason.clone(),
            },
            percent,
            &format!("Export failed: {reason}"),
        );
    }
}

/// Drives planning output through rendering, encoding, and delivery.
///
/// One export runs at a time; `run_export` borrows the exporter mutably.
pub struct Exporter {
    renderer: FrameRenderer,
    render: RenderSettings,
    encoder: EncoderPipeline,
    delivery: Option<Box<dyn ArtifactDelivery>>,
    tracker: JobTracker,
    seed: Option<u64>,
}

impl Exporter {
    /// Exporter built from application configuration, writing into
    /// `config.output_dir` and recording through ffmpeg.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            renderer: FrameRenderer::from_settings(&config.render),
            render: config.render.clone(),
            encoder: EncoderPipeline::new(config.encoder.clone()),
            delivery: Some(Box::new(DirectoryDelivery::new(config.output_dir.clone()))),
            tracker: JobTracker {
                job: Mutex::new(ExportJob::default()),
                callback: None,
            },
            seed: None,
        }
    }

    pub fn with_renderer(mut self, renderer: FrameRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replace the streaming capture backend.
    pub fn with_capture(mut self, capture: Box<dyn CaptureBackend>) -> Self {
        let settings = self.encoder.settings().clone();
        self.encoder = EncoderPipeline::with_capture(settings, capture);
        self
    }

    /// Replace (or with `None`, disable) artifact delivery.
    pub fn with_delivery(mut self, delivery: Option<Box<dyn ArtifactDelivery>>) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.tracker.callback = Some(callback);
        self
    }

    /// Pin the decorative random source.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn encoder(&self) -> &EncoderPipeline {
        &self.encoder
    }

    /// Snapshot of the current or most recent job.
    pub fn job(&self) -> ExportJob {
        self.tracker.snapshot()
    }

    /// Render and encode `storyboard`, then deliver the artifact.
    ///
    /// Every call starts a fresh job. Failures leave the job `Failed` and are
    /// never retried.
    pub async fn run_export(
        &mut self,
        storyboard: &Storyboard,
        config: &ExportConfig,
        cancel: &CancelToken,
    ) -> StoryResult<Artifact> {
        self.tracker.reset();
        let started = std::time::Instant::now();
        tracing::info!(
            title = %storyboard.title,
            scenes = storyboard.scenes.len(),
            format = %config.format,
            resolution = %config.resolution,
            quality = ?config.quality,
            "Starting export"
        );

        match self.run(storyboard, config, cancel).await {
            Ok(artifact) => {
                tracing::info!(
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    bytes = artifact.len(),
                    media_type = %artifact.media_type,
                    "Export finished"
                );
                Ok(artifact)
            }
            Err(err) => {
                self.tracker.fail(&err);
                Err(err)
            }
        }
    }

    async fn run(
        &mut self,
        storyboard: &Storyboard,
        config: &ExportConfig,
        cancel: &CancelToken,
    ) -> StoryResult<Artifact> {
        let tracker = &self.tracker;
        tracker.update(ExportPhase::Initializing, 0, "Initializing...");
        cancel.check()?;

        tracker.update(ExportPhase::GeneratingFrames, 10, "Generating frames...");
        let frames = self.generate_frames(storyboard, config, cancel).await?;

        tracker.update(
            ExportPhase::Encoding,
            ENCODE_BAND.0,
            &format!("Creating {} output...", config.format),
        );
        let on_milestone = |percent: u8, message: &str| {
            let (start, end) = ENCODE_BAND;
            let mapped = start as u32 + (end - start) as u32 * percent.min(100) as u32 / 100;
            tracker.update(ExportPhase::Encoding, mapped as u8, message);
        };
        let outcome = self
            .encoder
            .encode(frames, config, &on_milestone, cancel)
            .await?;

        if let Some(fallback) = &outcome.fallback {
            tracing::warn!(
                from = %fallback.from,
                to = %outcome.strategy,
                reason = %fallback.reason,
                "Export used fallback strategy"
            );
        }
        tracker.record_strategy(outcome.strategy, outcome.fallback.clone());

        tracker.update(ExportPhase::Finalizing, ENCODE_BAND.1, "Downloading file...");
        cancel.check()?;
        if let Some(delivery) = &self.delivery {
            let path = delivery.deliver(&outcome.artifact).await?;
            tracker.record_delivery(path);
        }

        tracker.update(ExportPhase::Complete, 100, "Export complete!");
        Ok(outcome.artifact)
    }

    async fn generate_frames(
        &self,
        storyboard: &Storyboard,
        config: &ExportConfig,
        cancel: &CancelToken,
    ) -> StoryResult<FrameSequence> {
        let (width, height) = config.resolution.dimensions();
        let clock = FrameClock::new(self.render.fps);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        self.tracker
            .update(ExportPhase::GeneratingFrames, 20, "Creating storyboard frames...");

        let scene_count = storyboard.scenes.len();
        let mut frames = FrameSequence::new();
        for (position, scene) in storyboard.scenes.iter().enumerate() {
            let cast = storyboard.cast(scene).ok_or_else(|| {
                StoryError::invalid_input(format!(
                    "scene {} references characters {:?} outside the roster",
                    scene.index, scene.character_pair
                ))
            })?;

            let count = self.render.frames_for_scene(scene.duration_secs);
            for frame_index in 0..count {
                cancel.check()?;
                let frame = self.renderer.render_frame(
                    scene,
                    cast,
                    clock.offset_secs(frame_index),
                    width,
                    height,
                    &mut rng,
                )?;
                frames.push(frame)?;
                tokio::task::yield_now().await;
            }

            let percent = 20 + ((position + 1) * 40 / scene_count) as u8;
            tracing::debug!(scene = scene.index, frames = count, "Scene rendered");
            self.tracker.update(
                ExportPhase::GeneratingFrames,
                percent.min(ENCODE_BAND.0),
                &format!("Rendered scene {} of {scene_count}", position + 1),
            );
        }

        tracing::info!(
            frames = frames.len(),
            stored_bytes = frames.stored_bytes(),
            "Frame generation finished"
        );
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_serialization() {
        let failed = ExportPhase::Failed {
            reason: "boom".to_string(),
        };
        let json = serde_json::to_string(&failed).unwrap();
        assert_eq!(json, r#"{"phase":"failed","reason":"boom"}"#);
        assert_eq!(
            serde_json::to_string(&ExportPhase::GeneratingFrames).unwrap(),
            r#"{"phase":"generating_frames"}"#
        );
        assert!(failed.is_terminal());
        assert!(!ExportPhase::Encoding.is_terminal());
    }

    #[test]
    fn test_tracker_clamps_progress() {
        let tracker = JobTracker {
            job: Mutex::new(ExportJob::default()),
            callback: None,
        };
        tracker.update(ExportPhase::Encoding, 70, "a");
        tracker.update(ExportPhase::Encoding, 65, "b");
        let job = tracker.snapshot();
        assert_eq!(job.progress_percent, 70);
        assert_eq!(job.status_message, "b");

        tracker.fail(&StoryError::Cancelled);
        let job = tracker.snapshot();
        assert_eq!(job.progress_percent, 70);
        assert_eq!(
            job.phase,
            ExportPhase::Failed {
                reason: "Export cancelled".to_string()
            }
        );
    }
}
