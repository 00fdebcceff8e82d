//! Fixed per-scene dressing tables.
//!
//! Every table has six entries and is indexed by `scene_index % 6`, so the
//! dressing of a scene depends on its position alone.

use storyreel_model::{Background, VisualEffect};

pub const TABLE_SIZE: usize = 6;

pub const BACKGROUNDS: [Background; TABLE_SIZE] = Background::ALL;

pub const ACTIONS: [&str; TABLE_SIZE] = [
    "jumping and spinning",
    "waving hands happily",
    "pointing at interesting things",
    "dancing in circles",
    "flying gently",
    "hugging and celebrating",
];

pub const TRANSITIONS: [&str; TABLE_SIZE] = [
    "fade to black",
    "slide from right",
    "zoom in transition",
    "sparkle effect",
    "bounce transition",
    "circle wipe",
];

pub const VISUAL_EFFECTS: [VisualEffect; TABLE_SIZE] = VisualEffect::ALL;

pub const SOUND_EFFECTS: [&str; TABLE_SIZE] = [
    "happy chimes",
    "whoosh sounds",
    "magical sparkles",
    "bubble pops",
    "gentle bells",
    "celebration fanfare",
];

/// Cosmetic attributes selected for one scene index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneDressing {
    pub background: Background,
    pub action: &'static str,
    pub transition: &'static str,
    pub visual_effect: VisualEffect,
    pub sound_effect: &'static str,
}

/// Look up the dressing for any scene index. Indices past the table wrap.
pub fn table_lookup(index: usize) -> SceneDressing {
    let slot = index % TABLE_SIZE;
    SceneDressing {
        background: BACKGROUNDS[slot],
        action: ACTIONS[slot],
        transition: TRANSITIONS[slot],
        visual_effect: VISUAL_EFFECTS[slot],
        sound_effect: SOUND_EFFECTS[slot],
    }
}

/// Roster indices for the two characters appearing in a scene.
pub fn character_pair(index: usize, roster_size: usize) -> [usize; 2] {
    if roster_size == 0 {
        return [0, 0];
    }
    [index % roster_size, (index + 1) % roster_size]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_wraps_after_six() {
        for i in 0..TABLE_SIZE * 3 {
            assert_eq!(table_lookup(i), table_lookup(i % TABLE_SIZE));
        }
        assert_eq!(table_lookup(6), table_lookup(0));
    }

    #[test]
    fn test_first_and_last_entries() {
        let first = table_lookup(0);
        assert_eq!(first.background, Background::Meadow);
        assert_eq!(first.action, "jumping and spinning");
        assert_eq!(first.transition, "fade to black");
        assert_eq!(first.visual_effect, VisualEffect::FloatingParticles);
        assert_eq!(first.sound_effect, "happy chimes");

        let last = table_lookup(5);
        assert_eq!(last.background, Background::Village);
        assert_eq!(last.transition, "circle wipe");
        assert_eq!(last.visual_effect, VisualEffect::Confetti);
        assert_eq!(last.sound_effect, "celebration fanfare");
    }

    #[test]
    fn test_character_pair_rotates_through_roster() {
        assert_eq!(character_pair(0, 3), [0, 1]);
        assert_eq!(character_pair(1, 3), [1, 2]);
        assert_eq!(character_pair(2, 3), [2, 0]);
        assert_eq!(character_pair(5, 3), [2, 0]);
    }
}
