//! Keyword sentiment heuristic.
//!
//! The result only shapes the tone-guidance sentence merged into the routing
//! prompt; it never affects control flow.

/// Detected mood of the cleaned input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sentiment {
    Frustrated,
    Positive,
    Questioning,
    Neutral,
}

const FRUSTRATED_MARKERS: &[&str] = &[
    "ugh", "argh", "damn", "stupid", "useless", "broken", "hate", "annoying", "frustrat",
    "not working", "doesn't work", "wrong again",
];

const POSITIVE_MARKERS: &[&str] = &[
    "thanks", "thank you", "great", "awesome", "perfect", "love", "nice", "wonderful", "excellent",
];

const QUESTION_MARKERS: &[&str] = &[
    "what", "when", "where", "who", "why", "how", "which", "can you", "could you", "do you",
];

impl Sentiment {
    /// Classify the cleaned input. Priority: frustrated, positive,
    /// questioning, then neutral.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();

        if FRUSTRATED_MARKERS.iter().any(|m| lower.contains(m)) {
            return Self::Frustrated;
        }
        if POSITIVE_MARKERS.iter().any(|m| lower.contains(m)) {
            return Self::Positive;
        }
        if lower.ends_with('?') || QUESTION_MARKERS.iter().any(|m| lower.starts_with(m)) {
            return Self::Questioning;
        }
        Self::Neutral
    }

    /// One tone-guidance sentence for the prompt.
    pub fn tone_guidance(self) -> &'static str {
        match self {
            Self::Frustrated => {
                "The user sounds frustrated. Be extra patient, apologetic, and concrete."
            }
            Self::Positive => "The user is in a good mood. Keep the tone warm and upbeat.",
            Self::Questioning => "The user is asking a question. Answer directly and clearly.",
            Self::Neutral => "Keep a friendly, helpful tone.",
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
