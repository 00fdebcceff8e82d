//! The storyboard: the complete planned output of the scene planner.

use serde::{Deserialize, Serialize};

use crate::character::Character;
use crate::export::ResolutionPreset;
use crate::scene::Scene;

/// Number of scenes every planned storyboard contains.
pub const SCENE_COUNT: usize = 6;

/// Ordered scenes plus the character roster they reference.
///
/// Created once per planning run and never mutated afterwards; re-planning
/// produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storyboard {
    pub title: String,

    /// Sum of all scene durations (seconds).
    pub duration_secs: u32,

    /// Target resolution label.
    pub resolution: ResolutionPreset,

    pub scenes: Vec<Scene>,

    /// Character roster referenced by `Scene::character_pair`.
    pub characters: Vec<Character>,
}

impl Storyboard {
    /// Resolve a scene's character pair against the roster.
    ///
    /// Returns `None` when the pair points outside the roster, which only
    /// happens for hand-built or deserialized storyboards.
    pub fn cast(&self, scene: &Scene) -> Option<[&Character; 2]> {
        let [a, b] = scene.character_pair;
        Some([self.characters.get(a)?, self.characters.get(b)?])
    }

    /// Sum of the individual scene durations.
    pub fn scene_duration_total(&self) -> u32 {
        self.scenes.iter().map(|s| s.duration_secs).sum()
    }

    /// Check structural invariants, returning a description of each problem.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = vec![];

        if self.scenes.len() != SCENE_COUNT {
            errors.push(format!(
                "expected {SCENE_COUNT} scenes, found {}",
                self.scenes.len()
            ));
        }

        if self.scene_duration_total() != self.duration_secs {
            errors.push(format!(
                "scene durations sum to {}s but storyboard declares {}s",
                self.scene_duration_total(),
                self.duration_secs
            ));
        }

        for (position, scene) in self.scenes.iter().enumerate() {
            if scene.index != position {
                errors.push(format!(
                    "scene at position {position} has index {}",
                    scene.index
                ));
            }
            if self.cast(scene).is_none() {
                errors.push(format!(
                    "scene {} references characters {:?} outside a roster of {}",
                    scene.index,
                    scene.character_pair,
                    self.characters.len()
                ));
            }
        }

        errors
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::default_roster;
    use crate::scene::{Background, VisualEffect, SCENE_DURATION_SECS};

    fn scene(index: usize, pair: [usize; 2]) -> Scene {
        Scene {
            index,
            duration_secs: SCENE_DURATION_SECS,
            text: format!("Scene {index}"),
            background: Background::ALL[index % 6],
            character_pair: pair,
            action: "waving hands happily".to_string(),
            transition: "fade to black".to_string(),
            visual_effect: VisualEffect::ALL[index % 6],
            sound_effect: "happy chimes".to_string(),
        }
    }

    fn storyboard() -> Storyboard {
        Storyboard {
            title: "Test".to_string(),
            duration_secs: 60,
            resolution: ResolutionPreset::Hd1080,
            scenes: (0..SCENE_COUNT).map(|i| scene(i, [i % 3, (i + 1) % 3])).collect(),
            characters: default_roster(),
        }
    }

    #[test]
    fn test_cast_resolves_pair() {
        let board = storyboard();
        let [a, b] = board.cast(&board.scenes[2]).unwrap();
        assert_eq!(a.name, "Spark");
        assert_eq!(b.name, "Luna");
    }

    #[test]
    fn test_valid_storyboard_has_no_problems() {
        assert!(storyboard().validate().is_empty());
    }

    #[test]
    fn test_validate_reports_bad_pair_and_duration() {
        let mut board = storyboard();
        board.scenes[1].character_pair = [0, 7];
        board.duration_secs = 50;

        let errors = board.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("outside a roster of 3")));
        assert!(errors.iter().any(|e| e.contains("sum to 60s")));
    }

    #[test]
    fn test_storyboard_serialization() {
        let board = storyboard();
        let json = board.to_json_pretty().unwrap();
        assert!(json.contains("\"1080p\""));
        assert!(json.contains("\"#FF6B9D\""));
        let parsed: Storyboard = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, board);
    }
}
