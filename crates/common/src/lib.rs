//! StoryReel Common Utilities
//!
//! Shared infrastructure for all StoryReel crates:
//! - Error types and result aliases
//! - Frame clock arithmetic for render and capture pacing
//! - Cooperative cancellation
//! - Tracing/logging initialization
//! - Configuration loading

pub mod cancel;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use cancel::*;
pub use clock::*;
pub use config::*;
pub use error::*;
