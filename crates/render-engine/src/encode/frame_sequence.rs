//! Animated image (GIF) strategy.

use std::sync::Arc;

use image::codecs::gif::{GifEncoder, Repeat};
use image::Delay;
use storyreel_common::{CancelToken, EncoderSettings, StoryError, StoryResult};
use storyreel_model::{Artifact, MediaType};
use tokio::sync::mpsc;

use super::{into_encoding, EncodingStrategy, ProgressGuard};
use crate::frame::FrameSequence;

const STRATEGY: EncodingStrategy = EncodingStrategy::FrameSequence;

/// Largest width or height a GIF logical screen can declare.
pub const MAX_GIF_DIMENSION: u32 = u16::MAX as u32;

/// Indices kept when sampling every `stride`-th frame.
pub fn sampled_indices(len: usize, stride: usize) -> Vec<usize> {
    (0..len).step_by(stride.max(1)).collect()
}

/// Encode every `gif_frame_stride`-th frame into an infinitely looping GIF.
pub async fn encode(
    frames: &Arc<FrameSequence>,
    settings: &EncoderSettings,
    progress: &ProgressGuard<'_>,
    cancel: &CancelToken,
) -> StoryResult<Artifact> {
    progress.report(0, "Creating GIF...");

    let kept = sampled_indices(frames.len(), settings.gif_frame_stride);
    let (width, height) = check_dimensions(frames, &kept)?;
    tracing::debug!(
        kept = kept.len(),
        total = frames.len(),
        width,
        height,
        delay_ms = settings.gif_frame_delay_ms,
        "Sampling frames for GIF"
    );

    let total = kept.len();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let task = {
        let frames = Arc::clone(frames);
        let cancel = cancel.clone();
        let delay_ms = settings.gif_frame_delay_ms;
        let speed = settings.gif_speed.clamp(1, 30);
        tokio::task::spawn_blocking(move || {
            write_gif(&frames, &kept, delay_ms, speed, &cancel, tx)
        })
    };

    while let Some(done) = rx.recv().await {
        progress.report_fraction(10, 85, done, total, "Adding frames to GIF...");
    }

    let bytes = task
        .await
        .map_err(|e| StoryError::encoding(STRATEGY.as_str(), e.to_string()))??;
    cancel.check()?;

    tracing::info!(bytes = bytes.len(), frames = total, "GIF created");
    progress.report(100, "GIF created");
    Ok(Artifact::new(bytes, MediaType::Gif))
}

fn check_dimensions(frames: &FrameSequence, kept: &[usize]) -> StoryResult<(u32, u32)> {
    let mut expected: Option<(u32, u32)> = None;
    for &index in kept {
        let Some(dims) = frames.dimensions(index) else {
            continue;
        };
        if dims.0 > MAX_GIF_DIMENSION || dims.1 > MAX_GIF_DIMENSION {
            return Err(StoryError::encoding(
                STRATEGY.as_str(),
                format!(
                    "frame {index} is {}x{}, larger than the GIF limit of {MAX_GIF_DIMENSION}",
                    dims.0, dims.1
                ),
            ));
        }
        match expected {
            None => expected = Some(dims),
            Some(first) if first != dims => {
                return Err(StoryError::encoding(
                    STRATEGY.as_str(),
                    format!(
                        "frame {index} is {}x{}, expected {}x{}",
                        dims.0, dims.1, first.0, first.1
                    ),
                ));
            }
            Some(_) => {}
        }
    }
    expected.ok_or_else(|| StoryError::invalid_input("no frames to encode"))
}

fn write_gif(
    frames: &FrameSequence,
    kept: &[usize],
    delay_ms: u32,
    speed: i32,
    cancel: &CancelToken,
    progress: mpsc::UnboundedSender<usize>,
) -> StoryResult<Vec<u8>> {
    let gif_error = |e: image::ImageError| StoryError::encoding(STRATEGY.as_str(), e.to_string());

    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut bytes, speed);
        encoder.set_repeat(Repeat::Infinite).map_err(gif_error)?;

        for (done, &index) in kept.iter().enumerate() {
            cancel.check()?;
            let frame = frames
                .decode(index)
                .map_err(|e| into_encoding(STRATEGY, e))?;
            let delay = Delay::from_numer_denom_ms(delay_ms, 1);
            encoder
                .encode_frame(image::Frame::from_parts(frame.image, 0, 0, delay))
                .map_err(gif_error)?;
            let _ = progress.send(done + 1);
        }
    }
    Ok(bytes)
}
