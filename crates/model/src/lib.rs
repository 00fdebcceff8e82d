//! StoryReel Model
//!
//! Defines the core data contracts shared by the planner, renderer, and
//! encoder:
//! - **Characters:** the fixed roster reused across scenes
//! - **Scenes / Storyboard:** the planned, immutable scene graph
//! - **Export:** format, resolution, and quality selection plus the final
//!   artifact
//!
//! Everything here is plain data. Planning lives in `storyreel-planner`,
//! rendering and encoding in `storyreel-render-engine`.

pub mod character;
pub mod export;
pub mod scene;
pub mod storyboard;

pub use character::*;
pub use export::*;
pub use scene::*;
pub use storyboard::*;
