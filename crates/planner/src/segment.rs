//! Sentence segmentation.

/// Characters that end a sentence.
pub const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Separator placed between sentences that share a scene.
pub const SENTENCE_JOINER: &str = ". ";

/// Split narration into trimmed, non-empty sentences in their original order.
///
/// A run of terminators (`"?!"`, `"..."`) counts as a single boundary.
/// Terminators themselves are dropped.
pub fn split_sentences(narration: &str) -> Vec<&str> {
    narration
        .split(TERMINATORS)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

/// `ceil(count / scenes)`, the number of sentences each scene receives.
pub fn sentences_per_scene(count: usize, scenes: usize) -> usize {
    if scenes == 0 {
        return 0;
    }
    count.div_ceil(scenes)
}

/// Slice `sentences` into exactly `scenes` chunks of `sentences_per_scene`
/// sentences. Trailing chunks are empty once the sentences run out.
pub fn deal<'a>(sentences: &[&'a str], scenes: usize) -> Vec<Vec<&'a str>> {
    let per_scene = sentences_per_scene(sentences.len(), scenes);
    (0..scenes)
        .map(|i| {
            let start = (i * per_scene).min(sentences.len());
            let end = ((i + 1) * per_scene).min(sentences.len());
            sentences[start..end].to_vec()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_all_terminators() {
        let sentences = split_sentences("One. Two! Three? Four");
        assert_eq!(sentences, ["One", "Two", "Three", "Four"]);
    }

    #[test]
    fn test_runs_of_terminators_are_one_boundary() {
        let sentences = split_sentences("Wait... what?! Really.");
        assert_eq!(sentences, ["Wait", "what", "Really"]);
    }

    #[test]
    fn test_whitespace_fragments_are_dropped() {
        assert!(split_sentences("  .  ! ?\n").is_empty());
        assert_eq!(split_sentences("\n  Hello there  .\t"), ["Hello there"]);
    }

    #[test]
    fn test_sentences_per_scene_rounds_up() {
        assert_eq!(sentences_per_scene(6, 6), 1);
        assert_eq!(sentences_per_scene(7, 6), 2);
        assert_eq!(sentences_per_scene(1, 6), 1);
        assert_eq!(sentences_per_scene(0, 6), 0);
    }

    #[test]
    fn test_deal_fills_early_scenes_first() {
        let sentences = ["a", "b", "c", "d", "e", "f", "g"];
        let chunks = deal(&sentences, 6);
        assert_eq!(chunks.len(), 6);
        assert_eq!(chunks[0], ["a", "b"]);
        assert_eq!(chunks[1], ["c", "d"]);
        assert_eq!(chunks[2], ["e", "f"]);
        assert_eq!(chunks[3], ["g"]);
        assert!(chunks[4].is_empty());
        assert!(chunks[5].is_empty());
    }
}
