//! Encoder pipeline: turns a frame sequence into a single artifact.
//!
//! ```text
//! FrameSequence ──┬── frame-sequence ──────────────────────────▶ image/gif
//!                 │
//!                 └── streaming-container ──┬── ok ────────────▶ video/webm
//!                                           │
//!                                           └── Encoding error
//!                                                   │
//!                                                   ▼
//!                                             contact-sheet ───▶ image/png
//! ```
//!
//! Only an encoding failure of the streaming path engages the fallback.
//! Cancellation and every other error propagate unchanged.

pub mod contact_sheet;
pub mod frame_sequence;
pub mod streaming;

use std::sync::{Arc, Mutex};

use serde::Serialize;
use storyreel_common::{CancelToken, EncoderSettings, StoryError, StoryResult};
use storyreel_model::{Artifact, ExportConfig, ExportFormat, MediaType};

use crate::frame::FrameSequence;
use streaming::{CaptureBackend, CaptureSession, FfmpegCapture};

/// Which strategy produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingStrategy {
    FrameSequence,
    StreamingContainer,
    ContactSheet,
}

impl EncodingStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            EncodingStrategy::FrameSequence => "frame-sequence",
            EncodingStrategy::StreamingContainer => "streaming-container",
            EncodingStrategy::ContactSheet => "contact-sheet",
        }
    }

    pub fn media_type(self) -> MediaType {
        match self {
            EncodingStrategy::FrameSequence => MediaType::Gif,
            EncodingStrategy::StreamingContainer => MediaType::Webm,
            EncodingStrategy::ContactSheet => MediaType::Png,
        }
    }
}

impl std::fmt::Display for EncodingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the pipeline left the requested strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackRecord {
    pub from: EncodingStrategy,
    pub reason: String,
}

/// Result of one encode call.
#[derive(Debug, Clone)]
pub struct EncodeOutcome {
    pub artifact: Artifact,
    pub strategy: EncodingStrategy,
    pub fallback: Option<FallbackRecord>,
}

/// Encoder milestone sink: `(percent 0..=100, status message)`.
pub type MilestoneFn<'a> = &'a (dyn Fn(u8, &str) + Send + Sync);

/// Per-item progress is forwarded at this many evenly spaced points.
const FRACTION_STEPS: usize = 4;

/// Forwards milestones to a sink, dropping any that would move backwards
/// or repeat the previous milestone exactly.
pub struct ProgressGuard<'a> {
    sink: MilestoneFn<'a>,
    last: Mutex<(u8, String)>,
}

impl<'a> ProgressGuard<'a> {
    pub fn new(sink: MilestoneFn<'a>) -> Self {
        Self {
            sink,
            last: Mutex::new((0, String::new())),
        }
    }

    pub fn report(&self, percent: u8, message: &str) {
        let percent = percent.min(100);
        {
            let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
            if percent < last.0 || (percent == last.0 && message == last.1) {
                return;
            }
            *last = (percent, message.to_string());
        }
        (self.sink)(percent, message);
    }

    /// `start + span * done / total`, forwarded only when `done` crosses a
    /// quarter of `total` or completes it.
    pub fn report_fraction(&self, start: u8, span: u8, done: usize, total: usize, message: &str) {
        let fraction = if total == 0 {
            1.0
        } else {
            let step = total.div_ceil(FRACTION_STEPS).max(1);
            if done < total && done % step != 0 {
                return;
            }
            done as f64 / total as f64
        };
        let percent = start as f64 + span as f64 * fraction.clamp(0.0, 1.0);
        self.report(percent.round() as u8, message);
    }

    pub fn last(&self) -> u8 {
        self.last.lock().unwrap_or_else(|e| e.into_inner()).0
    }
}

const FALLBACK_MESSAGE: &str = "Video creation failed, trying fallback...";

/// Selects and runs an encoding strategy, falling back when streaming fails.
pub struct EncoderPipeline {
    settings: EncoderSettings,
    capture: Box<dyn CaptureBackend>,
}

impl EncoderPipeline {
    /// Pipeline recording through the configured ffmpeg binary.
    pub fn new(settings: EncoderSettings) -> Self {
        let capture = Box::new(FfmpegCapture::new(settings.ffmpeg_binary.clone()));
        Self::with_capture(settings, capture)
    }

    pub fn with_capture(settings: EncoderSettings, capture: Box<dyn CaptureBackend>) -> Self {
        Self { settings, capture }
    }

    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    pub fn capture_backend(&self) -> &dyn CaptureBackend {
        self.capture.as_ref()
    }

    /// Encode `frames` according to `config`.
    ///
    /// Takes ownership of the sequence. Milestones passed to `on_progress`
    /// never decrease within one call and per-frame work is reported at
    /// quarter steps.
    pub async fn encode(
        &mut self,
        frames: FrameSequence,
        config: &ExportConfig,
        on_progress: MilestoneFn<'_>,
        cancel: &CancelToken,
    ) -> StoryResult<EncodeOutcome> {
        if frames.is_empty() {
            return Err(StoryError::invalid_input("no frames to encode"));
        }
        cancel.check()?;

        let frames = Arc::new(frames);
        let progress = ProgressGuard::new(on_progress);

        tracing::info!(
            frames = frames.len(),
            stored_bytes = frames.stored_bytes(),
            format = %config.format,
            resolution = %config.resolution,
            "Encoding frame sequence"
        );

        match config.format {
            ExportFormat::FrameSequence => {
                let artifact =
                    frame_sequence::encode(&frames, &self.settings, &progress, cancel).await?;
                Ok(EncodeOutcome {
                    artifact,
                    strategy: EncodingStrategy::FrameSequence,
                    fallback: None,
                })
            }
            ExportFormat::StreamingContainer => {
                let (width, height) = config.resolution.dimensions();
                let session = CaptureSession {
                    width,
                    height,
                    fps: self.settings.capture_fps,
                    bitrate_bps: config.quality.bitrate_bps(),
                };

                match streaming::encode(
                    self.capture.as_mut(),
                    &frames,
                    &session,
                    &progress,
                    cancel,
                )
                .await
                {
                    Ok(artifact) => Ok(EncodeOutcome {
                        artifact,
                        strategy: EncodingStrategy::StreamingContainer,
                        fallback: None,
                    }),
                    Err(err) if err.is_encoding() => {
                        tracing::warn!(
                            backend = self.capture.name(),
                            error = %err,
                            "Video creation failed, falling back to contact sheet"
                        );
                        progress.report(progress.last(), FALLBACK_MESSAGE);
                        let artifact =
                            contact_sheet::encode(&frames, &self.settings, &progress, cancel)
                                .await?;
                        Ok(EncodeOutcome {
                            artifact,
                            strategy: EncodingStrategy::ContactSheet,
                            fallback: Some(FallbackRecord {
                                from: EncodingStrategy::StreamingContainer,
                                reason: err.to_string(),
                            }),
                        })
                    }
                    Err(err) => Err(err),
                }
            }
        }
    }
}

/// Re-tag a strategy-internal failure as an encoding error of `strategy`.
///
/// Cancellation and caller errors pass through untouched.
pub(crate) fn into_encoding(strategy: EncodingStrategy, err: StoryError) -> StoryError {
    match err {
        StoryError::Cancelled
        | StoryError::InvalidInput { .. }
        | StoryError::Encoding { .. } => err,
        other => StoryError::encoding(strategy.as_str(), other.to_string()),
    }
}
