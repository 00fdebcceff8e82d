//! Real-time streaming container strategy.
//!
//! Frames are drawn one at a time onto a [`CaptureSurface`] and presented to
//! a [`CaptureBackend`] at the capture frame rate. The backend produces the
//! container bytes when finalized.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use storyreel_common::{CancelToken, FrameClock, StoryError, StoryResult};
use storyreel_model::{Artifact, MediaType};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{into_encoding, EncodingStrategy, ProgressGuard};
use crate::frame::{Frame, FrameSequence};

const STRATEGY: EncodingStrategy = EncodingStrategy::StreamingContainer;

fn encoding_error(message: impl Into<String>) -> StoryError {
    StoryError::encoding(STRATEGY.as_str(), message)
}

/// Parameters a capture backend is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSession {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate_bps: u32,
}

impl CaptureSession {
    pub fn clock(&self) -> FrameClock {
        FrameClock::new(self.fps)
    }
}

/// The drawing surface a capture backend records from.
///
/// Owned by a single encode call. Frames of a different size are scaled to
/// fill the surface.
pub struct CaptureSurface {
    canvas: RgbaImage,
}

impl CaptureSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        }
    }

    pub fn draw(&mut self, frame: &Frame) {
        if frame.dimensions() == self.canvas.dimensions() {
            self.canvas.copy_from_slice(frame.image.as_raw());
        } else {
            let (w, h) = self.canvas.dimensions();
            self.canvas = imageops::resize(&frame.image, w, h, FilterType::Triangle);
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.canvas.as_raw()
    }
}

/// A recorder that turns presented surfaces into container bytes.
///
/// Calls arrive in the order `open`, `present`*, `finalize`. `abort` may be
/// called at any point after `open` to discard a partial recording.
///
/// Only [`StoryError::Encoding`] failures make the pipeline fall back to a
/// contact sheet. Report an unusable capture path that way. Any other error,
/// including [`StoryError::Cancelled`], fails the encode as-is.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Backend name.
    fn name(&self) -> &str;

    /// Check if this backend can run on the system.
    fn is_available(&self) -> bool;

    async fn open(&mut self, session: &CaptureSession) -> StoryResult<()>;

    /// Record the current surface contents as the next frame.
    async fn present(&mut self, surface: &CaptureSurface) -> StoryResult<()>;

    /// Flush and return the finished container.
    async fn finalize(&mut self) -> StoryResult<Vec<u8>>;

    async fn abort(&mut self);
}

/// Record every frame through `backend`, paced at the session frame rate.
///
/// On any failure the backend is aborted before the error is returned.
pub async fn encode(
    backend: &mut dyn CaptureBackend,
    frames: &Arc<FrameSequence>,
    session: &CaptureSession,
    progress: &ProgressGuard<'_>,
    cancel: &CancelToken,
) -> StoryResult<Artifact> {
    let result = record(backend, frames, session, progress, cancel).await;
    if let Err(err) = &result {
        tracing::debug!(backend = backend.name(), error = %err, "Aborting capture");
        backend.abort().await;
    }
    result
}

async fn record(
    backend: &mut dyn CaptureBackend,
    frames: &Arc<FrameSequence>,
    session: &CaptureSession,
    progress: &ProgressGuard<'_>,
    cancel: &CancelToken,
) -> StoryResult<Artifact> {
    progress.report(0, "Creating video...");
    backend.open(session).await?;
    tracing::info!(
        backend = backend.name(),
        width = session.width,
        height = session.height,
        fps = session.fps,
        bitrate_bps = session.bitrate_bps,
        expected_secs = session.clock().span(frames.len()).as_secs_f64(),
        "Capture started"
    );

    let mut surface = CaptureSurface::new(session.width, session.height);
    progress.report(15, "Recording video frames...");

    let mut ticker = tokio::time::interval(session.clock().interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let total = frames.len();
    for index in 0..total {
        cancel.check()?;
        let frame = frames
            .decode_blocking(index)
            .await
            .map_err(|e| into_encoding(STRATEGY, e))?;
        cancel.check()?;

        surface.draw(&frame);
        ticker.tick().await;
        cancel.check()?;

        backend.present(&surface).await?;
        progress.report_fraction(30, 50, index + 1, total, "Recording frames...");
    }

    progress.report(80, "Finalizing video...");
    let bytes = backend.finalize().await?;
    cancel.check()?;

    if bytes.is_empty() {
        return Err(encoding_error(format!(
            "{} produced an empty recording",
            backend.name()
        )));
    }

    tracing::info!(bytes = bytes.len(), frames = total, "Video created");
    progress.report(100, "Video created");
    Ok(Artifact::new(bytes, MediaType::Webm))
}

/// Records WebM (VP8) by piping raw RGBA frames into an ffmpeg child process.
pub struct FfmpegCapture {
    binary: String,
    running: Option<RunningCapture>,
}

struct RunningCapture {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout_task: JoinHandle<std::io::Result<Vec<u8>>>,
    stderr_task: JoinHandle<String>,
}

impl FfmpegCapture {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            running: None,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for FfmpegCapture {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

/// Command-line arguments for recording `session` from stdin to stdout.
pub fn ffmpeg_args(session: &CaptureSession) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgba".to_string(),
        "-s".to_string(),
        format!("{}x{}", session.width, session.height),
        "-framerate".to_string(),
        session.clock().fps().to_string(),
        "-i".to_string(),
        "pipe:0".to_string(),
        "-an".to_string(),
        "-c:v".to_string(),
        "libvpx".to_string(),
        "-b:v".to_string(),
        session.bitrate_bps.to_string(),
        "-deadline".to_string(),
        "realtime".to_string(),
        "-cpu-used".to_string(),
        "8".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-f".to_string(),
        "webm".to_string(),
        "pipe:1".to_string(),
    ]
}

#[async_trait]
impl CaptureBackend for FfmpegCapture {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    async fn open(&mut self, session: &CaptureSession) -> StoryResult<()> {
        if self.running.is_some() {
            return Err(encoding_error("ffmpeg capture is already open"));
        }

        let args = ffmpeg_args(session);
        tracing::debug!(binary = %self.binary, args = ?args, "Running ffmpeg");
        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| encoding_error(format!("Failed to start {}: {e}", self.binary)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| encoding_error("Failed to capture ffmpeg stdin"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| encoding_error("Failed to capture ffmpeg stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| encoding_error("Failed to capture ffmpeg stderr"))?;

        // Drain stdout and stderr concurrently with stdin writes.
        let stdout_task = tokio::spawn(async move {
            let mut bytes = Vec::new();
            stdout.read_to_end(&mut bytes).await.map(|_| bytes)
        });
        let stderr_task = tokio::spawn(async move {
            let mut output = String::new();
            match stderr.read_to_string(&mut output).await {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        tracing::info!(pid = ?child.id(), "ffmpeg process started");
        self.running = Some(RunningCapture {
            child,
            stdin: Some(stdin),
            stdout_task,
            stderr_task,
        });
        Ok(())
    }

    async fn present(&mut self, surface: &CaptureSurface) -> StoryResult<()> {
        let stdin = self
            .running
            .as_mut()
            .and_then(|running| running.stdin.as_mut())
            .ok_or_else(|| encoding_error("ffmpeg capture not started"))?;
        stdin
            .write_all(surface.as_raw())
            .await
            .map_err(|e| encoding_error(format!("Failed writing frame to ffmpeg: {e}")))
    }

    async fn finalize(&mut self) -> StoryResult<Vec<u8>> {
        let mut running = self
            .running
            .take()
            .ok_or_else(|| encoding_error("ffmpeg capture not started"))?;

        if let Some(mut stdin) = running.stdin.take() {
            stdin
                .shutdown()
                .await
                .map_err(|e| encoding_error(format!("Failed to close ffmpeg stdin: {e}")))?;
        }

        let status = running
            .child
            .wait()
            .await
            .map_err(|e| encoding_error(format!("Failed to wait on ffmpeg: {e}")))?;
        let stdout = running
            .stdout_task
            .await
            .map_err(|e| encoding_error(format!("ffmpeg stdout reader panicked: {e}")))?
            .map_err(|e| encoding_error(format!("Failed reading ffmpeg output: {e}")))?;
        let stderr = running
            .stderr_task
            .await
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(encoding_error(format!(
                "ffmpeg recording failed (status {status}): {}",
                stderr.trim()
            )));
        }
        Ok(stdout)
    }

    async fn abort(&mut self) {
        if let Some(mut running) = self.running.take() {
            if let Err(err) = running.child.start_kill() {
                tracing::warn!(error = %err, "Failed to kill ffmpeg");
            }
            let _ = running.child.wait().await;
            running.stdout_task.abort();
            running.stderr_task.abort();
        }
    }
}

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
