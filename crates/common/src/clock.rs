//! Frame clock arithmetic.
//!
//! Both the frame renderer and the capture surface run on a fixed frame
//! rate. This module converts between frame indices, time offsets, and
//! pacing intervals so the two sides agree on what "frame N" means.

use std::time::Duration;

/// A fixed-rate frame clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    fps: u32,
}

impl FrameClock {
    /// Create a clock ticking at `fps` frames per second. A rate of zero is
    /// clamped to one.
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }

    /// Frames per second.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Wall-clock interval between two frames.
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.fps as u64)
    }

    /// Time offset (seconds) of the given frame from the start.
    pub fn offset_secs(&self, frame: u32) -> f32 {
        frame as f32 / self.fps as f32
    }

    /// Wall-clock time needed to present `frames` frames at this rate.
    pub fn span(&self, frames: usize) -> Duration {
        self.interval().saturating_mul(frames as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_at_ten_fps() {
        let clock = FrameClock::new(10);
        assert_eq!(clock.interval(), Duration::from_millis(100));
        assert_eq!(clock.span(180), Duration::from_secs(18));
    }

    #[test]
    fn test_offsets_follow_frame_rate() {
        let clock = FrameClock::new(10);
        assert!((clock.offset_secs(0) - 0.0).abs() < 1e-6);
        assert!((clock.offset_secs(15) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_fps_is_clamped() {
        let clock = FrameClock::new(0);
        assert_eq!(clock.fps(), 1);
        assert_eq!(clock.interval(), Duration::from_secs(1));
    }
}
