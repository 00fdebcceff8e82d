//! Rendered frames and the ordered sequence handed to the encoder.

use std::io::Cursor;
use std::sync::Arc;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use storyreel_common::{StoryError, StoryResult};

/// One rasterized image of a scene at a time offset.
#[derive(Debug, Clone)]
pub struct Frame {
    pub scene_index: usize,

    /// Seconds since the start of the scene.
    pub time_offset_secs: f32,

    pub image: RgbaImage,
}

impl Frame {
    pub fn new(scene_index: usize, time_offset_secs: f32, image: RgbaImage) -> Self {
        Self {
            scene_index,
            time_offset_secs,
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// A frame held as a compressed PNG until an encoder asks for its pixels.
#[derive(Debug, Clone)]
struct StoredFrame {
    scene_index: usize,
    time_offset_secs: f32,
    width: u32,
    height: u32,
    png: Vec<u8>,
}

/// Ordered, append-only collection of frames.
///
/// Frames must arrive in strictly increasing `(scene_index, time_offset)`
/// order. Pixels are stored PNG-compressed and decoded on demand, so a full
/// storyboard fits in memory at 1080p.
#[derive(Debug, Default)]
pub struct FrameSequence {
    frames: Vec<StoredFrame>,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compress and append a frame.
    pub fn push(&mut self, frame: Frame) -> StoryResult<()> {
        if let Some(last) = self.frames.last() {
            let advances = frame.scene_index > last.scene_index
                || (frame.scene_index == last.scene_index
                    && frame.time_offset_secs > last.time_offset_secs);
            if !advances {
                return Err(StoryError::invalid_input(format!(
                    "frame (scene {}, {:.2}s) does not follow (scene {}, {:.2}s)",
                    frame.scene_index,
                    frame.time_offset_secs,
                    last.scene_index,
                    last.time_offset_secs
                )));
            }
        }

        let (width, height) = frame.dimensions();
        let png = encode_png(&frame.image, CompressionType::Fast)?;
        self.frames.push(StoredFrame {
            scene_index: frame.scene_index,
            time_offset_secs: frame.time_offset_secs,
            width,
            height,
            png,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Dimensions of the frame at `index`, without decoding it.
    pub fn dimensions(&self, index: usize) -> Option<(u32, u32)> {
        self.frames.get(index).map(|f| (f.width, f.height))
    }

    /// Total compressed size in bytes.
    pub fn stored_bytes(&self) -> usize {
        self.frames.iter().map(|f| f.png.len()).sum()
    }

    /// Decode the frame at `index` on the calling thread.
    pub fn decode(&self, index: usize) -> StoryResult<Frame> {
        let stored = self.frames.get(index).ok_or_else(|| {
            StoryError::invalid_input(format!(
                "frame {index} out of range for a sequence of {}",
                self.frames.len()
            ))
        })?;
        let image = image::load_from_memory_with_format(&stored.png, ImageFormat::Png)
            .map_err(anyhow::Error::from)?
            .into_rgba8();
        Ok(Frame::new(stored.scene_index, stored.time_offset_secs, image))
    }

    /// Decode the frame at `index` on the blocking pool.
    pub async fn decode_blocking(self: &Arc<Self>, index: usize) -> StoryResult<Frame> {
        let sequence = Arc::clone(self);
        tokio::task::spawn_blocking(move || sequence.decode(index))
            .await
            .map_err(anyhow::Error::from)?
    }
}

/// Encode an RGBA image as PNG.
pub fn encode_png(image: &RgbaImage, compression: CompressionType) -> StoryResult<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new_with_quality(Cursor::new(&mut bytes), compression, FilterType::Adaptive)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(anyhow::Error::from)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(scene: usize, t: f32, rgba: [u8; 4]) -> Frame {
        Frame::new(scene, t, RgbaImage::from_pixel(16, 9, Rgba(rgba)))
    }

    #[test]
    fn test_push_and_decode_preserves_pixels() {
        let mut sequence = FrameSequence::new();
        sequence.push(solid(0, 0.0, [10, 20, 30, 255])).unwrap();
        sequence.push(solid(0, 0.1, [40, 50, 60, 255])).unwrap();

        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.dimensions(1), Some((16, 9)));
        let frame = sequence.decode(1).unwrap();
        assert_eq!(frame.scene_index, 0);
        assert_eq!(frame.image.get_pixel(3, 3), &Rgba([40, 50, 60, 255]));
    }

    #[test]
    fn test_out_of_order_push_is_rejected() {
        let mut sequence = FrameSequence::new();
        sequence.push(solid(1, 0.0, [0, 0, 0, 255])).unwrap();

        let same = sequence.push(solid(1, 0.0, [0, 0, 0, 255]));
        assert!(matches!(same, Err(StoryError::InvalidInput { .. })));

        let earlier_scene = sequence.push(solid(0, 0.5, [0, 0, 0, 255]));
        assert!(matches!(earlier_scene, Err(StoryError::InvalidInput { .. })));

        sequence.push(solid(2, 0.0, [0, 0, 0, 255])).unwrap();
        assert_eq!(sequence.len(), 2);
    }

    #[test]
    fn test_decode_out_of_range() {
        let sequence = FrameSequence::new();
        assert!(sequence.is_empty());
        assert!(matches!(
            sequence.decode(0),
            Err(StoryError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_decode_blocking_matches_inline_decode() {
        let mut sequence = FrameSequence::new();
        sequence.push(solid(0, 0.0, [1, 2, 3, 255])).unwrap();
        let sequence = Arc::new(sequence);

        let frame = sequence.decode_blocking(0).await.unwrap();
        assert_eq!(frame.image, sequence.decode(0).unwrap().image);
    }
}
