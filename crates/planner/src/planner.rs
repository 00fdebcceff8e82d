use storyreel_common::{StoryError, StoryResult};
use storyreel_model::{
    default_roster, ResolutionPreset, Scene, Storyboard, SCENE_COUNT, SCENE_DURATION_SECS,
};

use crate::segment::{deal, split_sentences, SENTENCE_JOINER};
use crate::tables::{character_pair, table_lookup};

pub const DEFAULT_TITLE: &str = "Generated Storyboard";

/// Options for [`plan_with`].
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub title: String,
    pub resolution: ResolutionPreset,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            resolution: ResolutionPreset::Hd1080,
        }
    }
}

/// Plan a storyboard with default title and resolution.
pub fn plan(narration: &str) -> StoryResult<Storyboard> {
    plan_with(narration, &PlanOptions::default())
}

/// Plan a six-scene storyboard from narration text.
///
/// Fails only when the narration is empty after trimming. Narration with
/// fewer than six sentences leaves the trailing scenes without text.
pub fn plan_with(narration: &str, options: &PlanOptions) -> StoryResult<Storyboard> {
    if narration.trim().is_empty() {
        return Err(StoryError::invalid_input("narration is empty"));
    }

    let sentences = split_sentences(narration);
    let characters = default_roster();

    let scenes: Vec<Scene> = deal(&sentences, SCENE_COUNT)
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let dressing = table_lookup(index);
            Scene {
                index,
                duration_secs: SCENE_DURATION_SECS,
                text: chunk.join(SENTENCE_JOINER).trim().to_string(),
                background: dressing.background,
                character_pair: character_pair(index, characters.len()),
                action: dressing.action.to_string(),
                transition: dressing.transition.to_string(),
                visual_effect: dressing.visual_effect,
                sound_effect: dressing.sound_effect.to_string(),
            }
        })
        .collect();

    let duration_secs = scenes.iter().map(|s| s.duration_secs).sum();

    tracing::debug!(
        sentences = sentences.len(),
        scenes = scenes.len(),
        empty_scenes = scenes.iter().filter(|s| !s.has_text()).count(),
        duration_secs,
        "Planned storyboard"
    );

    Ok(Storyboard {
        title: options.title.clone(),
        duration_secs,
        resolution: options.resolution,
        scenes,
        characters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_narration_is_rejected() {
        assert!(matches!(plan(""), Err(StoryError::InvalidInput { .. })));
        assert!(matches!(plan("  \n\t "), Err(StoryError::InvalidInput { .. })));
    }

    #[test]
    fn test_only_punctuation_yields_six_empty_scenes() {
        let board = plan("...!?").unwrap();
        assert_eq!(board.scenes.len(), SCENE_COUNT);
        assert!(board.scenes.iter().all(|s| !s.has_text()));
    }

    #[test]
    fn test_defaults_and_totals() {
        let board = plan("A fox ran. A bird sang.").unwrap();
        assert_eq!(board.title, DEFAULT_TITLE);
        assert_eq!(board.resolution, ResolutionPreset::Hd1080);
        assert_eq!(board.duration_secs, 60);
        assert_eq!(board.characters.len(), 3);
        assert!(board.validate().is_empty());
    }

    #[test]
    fn test_sentences_sharing_a_scene_are_joined() {
        let narration = (1..=12)
            .map(|i| format!("Line {i}"))
            .collect::<Vec<_>>()
            .join(". ");
        let board = plan(&narration).unwrap();
        assert_eq!(board.scenes[0].text, "Line 1. Line 2");
        assert_eq!(board.scenes[5].text, "Line 11. Line 12");
    }

    #[test]
    fn test_options_are_carried() {
        let options = PlanOptions {
            title: "Bedtime".to_string(),
            resolution: ResolutionPreset::Hd720,
        };
        let board = plan_with("Once upon a time.", &options).unwrap();
        assert_eq!(board.title, "Bedtime");
        assert_eq!(board.resolution, ResolutionPreset::Hd720);
    }
}
