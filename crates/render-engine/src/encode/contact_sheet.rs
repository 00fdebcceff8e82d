//! Contact-sheet fallback: every frame tiled into one PNG.

use std::sync::Arc;

use image::codecs::png::CompressionType;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use storyreel_common::{CancelToken, EncoderSettings, StoryError, StoryResult};
use storyreel_model::{Artifact, MediaType};

use super::{into_encoding, EncodingStrategy, ProgressGuard};
use crate::frame::{encode_png, FrameSequence};

const STRATEGY: EncodingStrategy = EncodingStrategy::ContactSheet;

/// Grid shape for a sheet of `count` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl SheetLayout {
    /// `ceil(sqrt(count))` columns and as many rows as needed.
    pub fn for_count(count: usize, cell_width: u32, cell_height: u32) -> Self {
        let count = count as u32;
        let mut columns = (count as f64).sqrt().ceil() as u32;
        // Float rounding can leave a perfect square one column short.
        while columns * columns < count {
            columns += 1;
        }
        let rows = if columns == 0 {
            0
        } else {
            count.div_ceil(columns)
        };
        Self {
            columns,
            rows,
            cell_width,
            cell_height,
        }
    }

    pub fn sheet_size(&self) -> (u32, u32) {
        (self.columns * self.cell_width, self.rows * self.cell_height)
    }

    /// Top-left pixel of the cell holding frame `index`.
    pub fn cell_origin(&self, index: usize) -> (u32, u32) {
        let index = index as u32;
        (
            (index % self.columns) * self.cell_width,
            (index / self.columns) * self.cell_height,
        )
    }
}

/// Tile every frame into a single PNG image.
///
/// Frames that cannot be decoded leave their cell blank.
pub async fn encode(
    frames: &Arc<FrameSequence>,
    settings: &EncoderSettings,
    progress: &ProgressGuard<'_>,
    cancel: &CancelToken,
) -> StoryResult<Artifact> {
    progress.report(60, "Creating image sequence...");

    let layout = SheetLayout::for_count(
        frames.len(),
        settings.contact_cell_width.max(1),
        settings.contact_cell_height.max(1),
    );
    let (sheet_w, sheet_h) = layout.sheet_size();
    tracing::info!(
        frames = frames.len(),
        columns = layout.columns,
        rows = layout.rows,
        sheet_w,
        sheet_h,
        "Building contact sheet"
    );

    let mut sheet = RgbaImage::new(sheet_w, sheet_h);
    let total = frames.len();
    for index in 0..total {
        cancel.check()?;
        match frames.decode_blocking(index).await {
            Ok(frame) => {
                let thumb = imageops::resize(
                    &frame.image,
                    layout.cell_width,
                    layout.cell_height,
                    FilterType::Triangle,
                );
                let (x, y) = layout.cell_origin(index);
                imageops::replace(&mut sheet, &thumb, x as i64, y as i64);
            }
            Err(StoryError::Cancelled) => return Err(StoryError::Cancelled),
            Err(err) => {
                tracing::warn!(index, error = %err, "Leaving contact sheet cell blank");
            }
        }
        progress.report_fraction(60, 35, index + 1, total, "Creating image sequence...");
    }

    cancel.check()?;
    let bytes = tokio::task::spawn_blocking(move || encode_png(&sheet, CompressionType::Default))
        .await
        .map_err(|e| StoryError::encoding(STRATEGY.as_str(), e.to_string()))?
        .map_err(|e| into_encoding(STRATEGY, e))?;

    tracing::info!(bytes = bytes.len(), "Contact sheet created");
    progress.report(100, "Image sequence created");
    Ok(Artifact::new(bytes, MediaType::Png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use image::{GenericImageView, Rgba};

    fn noop(_: u8, _: &str) {}

    #[test]
    fn test_layout_for_counts() {
        let layout = SheetLayout::for_count(180, 320, 180);
        assert_eq!((layout.columns, layout.rows), (14, 13));
        assert_eq!(layout.sheet_size(), (14 * 320, 13 * 180));

        let square = SheetLayout::for_count(9, 320, 180);
        assert_eq!((square.columns, square.rows), (3, 3));

        let single = SheetLayout::for_count(1, 320, 180);
        assert_eq!((single.columns, single.rows), (1, 1));
        assert_eq!(single.cell_origin(0), (0, 0));

        assert_eq!(SheetLayout::for_count(5, 10, 10).cell_origin(4), (10, 10));
    }

    #[tokio::test]
    async fn test_sheet_tiles_frames_in_order() {
        let colors = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]];
        let mut sequence = FrameSequence::new();
        for (i, rgba) in colors.iter().enumerate() {
            let image = RgbaImage::from_pixel(64, 36, Rgba(*rgba));
            sequence.push(Frame::new(i, 0.0, image)).unwrap();
        }
        let frames = Arc::new(sequence);
        let settings = EncoderSettings {
            contact_cell_width: 32,
            contact_cell_height: 18,
            ..EncoderSettings::default()
        };
        let guard = ProgressGuard::new(&noop);

        let artifact = encode(&frames, &settings, &guard, &CancelToken::new())
            .await
            .unwrap();
        assert_eq!(artifact.media_type, MediaType::Png);
        assert_eq!(guard.last(), 100);

        let sheet = image::load_from_memory(&artifact.bytes).unwrap();
        // 3 frames: 2 columns, 2 rows; the last cell stays blank.
        assert_eq!(sheet.dimensions(), (64, 36));
        assert_eq!(sheet.get_pixel(16, 9), Rgba([255, 0, 0, 255]));
        assert_eq!(sheet.get_pixel(48, 9), Rgba([0, 255, 0, 255]));
        assert_eq!(sheet.get_pixel(16, 27), Rgba([0, 0, 255, 255]));
        assert_eq!(sheet.get_pixel(48, 27), Rgba([0, 0, 0, 0]));
    }
}
