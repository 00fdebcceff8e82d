//! StoryReel Planner
//!
//! Turns free-form narration into a fixed six-scene [`Storyboard`]:
//! - **Segmentation:** split narration into sentences and deal them out to
//!   scenes in order
//! - **Dressing:** pick background, action, transition, effect, and sound
//!   for each scene from fixed tables
//! - **Casting:** pair roster characters by scene index
//!
//! This crate is pure computation. No I/O, no randomness, no suspension.
//!
//! [`Storyboard`]: storyreel_model::Storyboard

pub mod segment;
pub mod tables;

mod planner;

pub use planner::{plan, plan_with, PlanOptions, DEFAULT_TITLE};
pub use segment::split_sentences;
pub use tables::{table_lookup, SceneDressing};
