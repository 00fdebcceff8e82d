//! StoryReel Render Engine
//!
//! Turns a planned storyboard into a single downloadable artifact.
//!
//! # Pipeline
//!
//! ```text
//! Storyboard ──► FrameRenderer (per scene, per frame offset)
//!                      │
//!                      ▼
//!                FrameSequence (ordered, PNG-compressed)
//!                      │
//!                      ▼
//!               EncoderPipeline ──┬── frame sequence   ──► image/gif
//!                                 └── streaming capture ──► video/webm
//!                                           │ (on failure)
//!                                           ▼
//!                                     contact sheet     ──► image/png
//!                      │
//!                      ▼
//!               ArtifactDelivery (output directory)
//! ```
//!
//! [`Exporter`] drives the whole pipeline and reports progress through an
//! [`ExportJob`].

pub mod compositor;
pub mod delivery;
pub mod encode;
pub mod export;
pub mod frame;
pub mod text;

pub use compositor::FrameRenderer;
pub use delivery::{ArtifactDelivery, DirectoryDelivery};
pub use encode::streaming::{CaptureBackend, CaptureSession, CaptureSurface, FfmpegCapture};
pub use encode::{EncodeOutcome, EncoderPipeline, EncodingStrategy, FallbackRecord};
pub use export::*;
pub use frame::{Frame, FrameSequence};
pub use text::TextFace;
