//! Wake-phrase stripping and routing-prompt composition.

use crate::sentiment::Sentiment;
use crate::skills::SkillRegistry;

/// Strip the first recognized wake phrase from the start of the input.
///
/// Matching is case-insensitive and prefix-only; longer phrases are tried
/// first so "hey vox" is not half-eaten by "vox". Leading separators after
/// the phrase are trimmed. Returns the cleaned text and whether a wake
/// phrase was found.
pub fn strip_wake_phrase(input: &str, wake_phrases: &[String]) -> (String, bool) {
    let trimmed = input.trim();

    let mut phrases: Vec<&String> = wake_phrases.iter().collect();
    phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));

    for phrase in phrases {
        let phrase_lower = phrase.to_lowercase();
        if phrase_lower.is_empty() {
            continue;
        }
        let Some(matched_len) = case_insensitive_prefix_len(trimmed, &phrase_lower) else {
            continue;
        };
        // Must end at a word boundary: "voxel engine" is not a wake
        let rest = &trimmed[matched_len..];
        if !rest.is_empty() && !rest.starts_with([' ', ',', ':', '!', '.']) {
            continue;
        }
        let cleaned = rest.trim_start_matches([' ', ',', ':', '!', '.']).to_string();
        return (cleaned, true);
    }

    (trimmed.to_string(), false)
}

/// Byte length of the prefix of `raw` whose lowercase form equals
/// `phrase_lower`, or `None` if it is not a prefix. Case folding can change
/// byte lengths (e.g. `ẞ` is three bytes, `ß` two), so the offset must be
/// measured on the raw text, never on the folded one.
fn case_insensitive_prefix_len(raw: &str, phrase_lower: &str) -> Option<usize> {
    let mut expected = phrase_lower.chars().peekable();
    for (idx, ch) in raw.char_indices() {
        if expected.peek().is_none() {
            return Some(idx);
        }
        for folded in ch.to_lowercase() {
            match expected.next() {
                Some(e) if e == folded => {}
                // Diverged, or the phrase ends inside this character's fold;
                // a boundary cannot sit mid-character.
                _ => return None,
            }
        }
    }
    if expected.peek().is_none() {
        Some(raw.len())
    } else {
        None
    }
}

/// Compose the routing prompt: persona, tone guidance, skill catalog, JSON
/// reply instructions, and the cleaned input.
pub fn compose_routing_prompt(
    assistant_name: &str,
    sentiment: Sentiment,
    skills: &SkillRegistry,
    cleaned_input: &str,
) -> String {
    let catalog = skills.prompt_catalog();
    let catalog_section = if catalog.is_empty() {
        "(no skills registered)".to_string()
    } else {
        catalog
    };

    format!(
        "You are {assistant_name}, a helpful voice assistant. You decide how to handle the \
user's request: either respond conversationally or invoke one of your skills.\n\
{tone}\n\
\n\
Available skills:\n\
{catalog_section}\n\
\n\
Reply with exactly one JSON object and nothing else:\n\
- To respond conversationally: {{\"skill\": \"speak\", \"args\": {{\"text\": \"<your reply>\"}}}}\n\
- To invoke a skill: {{\"skill\": \"<skill name>\", \"args\": {{...}}}}\n\
You may add optional fields \"explanation\" (string), \"confidence_score\" (0.0-1.0), \
and \"warnings\" (list of strings).\n\
\n\
User request: {cleaned_input}",
        tone = sentiment.tone_guidance(),
    )
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases() -> Vec<String> {
        vec![
            "hey codex".to_string(),
            "okay codex".to_string(),
            "codex".to_string(),
        ]
    }

    #[test]
    fn test_strip_simple_prefix() {
        let (cleaned, detected) = strip_wake_phrase("codex what is 2 plus 2", &phrases());
        assert_eq!(cleaned, "what is 2 plus 2");
        assert!(detected);
    }

    #[test]
    fn test_strip_case_insensitive() {
        let (cleaned, detected) = strip_wake_phrase("Hey Codex, turn on the lights", &phrases());
        assert_eq!(cleaned, "turn on the lights");
        assert!(detected);
    }

    #[test]
    fn test_longest_phrase_wins() {
        // "hey codex" must not be consumed as just "codex" failing the prefix
        let (cleaned, detected) = strip_wake_phrase("hey codex hello", &phrases());
        assert_eq!(cleaned, "hello");
        assert!(detected);
    }

    #[test]
    fn test_no_wake_phrase() {
        let (cleaned, detected) = strip_wake_phrase("what time is it", &phrases());
        assert_eq!(cleaned, "what time is it");
        assert!(!detected);
    }

    #[test]
    fn test_mid_sentence_not_stripped() {
        let (cleaned, detected) = strip_wake_phrase("tell codex something", &phrases());
        assert_eq!(cleaned, "tell codex something");
        assert!(!detected);
    }

    #[test]
    fn test_word_boundary_respected() {
        let (cleaned, detected) = strip_wake_phrase("codexify this text", &phrases());
        assert_eq!(cleaned, "codexify this text");
        assert!(!detected);
    }

    #[test]
    fn test_bare_wake_phrase() {
        let (cleaned, detected) = strip_wake_phrase("codex", &phrases());
        assert_eq!(cleaned, "");
        assert!(detected);
    }

    #[test]
    fn test_case_fold_changes_byte_length() {
        // U+1E9E (ẞ) is three bytes but lowercases to the two-byte ß; the
        // stripped offset must come from the raw input, not the folded form.
        let phrases = vec!["ß".to_string()];
        let (cleaned, detected) = strip_wake_phrase("ẞ hello", &phrases);
        assert_eq!(cleaned, "hello");
        assert!(detected);

        let (cleaned, detected) = strip_wake_phrase("ß hello", &phrases);
        assert_eq!(cleaned, "hello");
        assert!(detected);
    }

    #[test]
    fn test_case_fold_boundary_mid_character_not_stripped() {
        // "İ" lowercases to two chars (i + combining dot); a phrase ending
        // after the bare "i" would split that fold, so it must not match.
        let phrases = vec!["i".to_string()];
        let (cleaned, detected) = strip_wake_phrase("İstanbul weather", &phrases);
        assert_eq!(cleaned, "İstanbul weather");
        assert!(!detected);
    }

    #[test]
    fn test_prompt_contains_all_sections() {
        let registry = SkillRegistry::new();
        let prompt = compose_routing_prompt(
            "Vox",
            Sentiment::Questioning,
            &registry,
            "what is the capital of France",
        );

        assert!(prompt.contains("You are Vox"));
        assert!(prompt.contains("asking a question"));
        assert!(prompt.contains("\"skill\": \"speak\""));
        assert!(prompt.contains("User request: what is the capital of France"));
        assert!(prompt.contains("(no skills registered)"));
    }
}
