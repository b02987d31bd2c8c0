//! Shared types — structured action decisions parsed from model output,
//! and per-turn interaction records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────
// Action decisions
// ─────────────────────────────────────────────

/// What the routing model decided a user turn should do.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Respond conversationally with the given text.
    Speak { text: String },
    /// Invoke a named skill with JSON arguments.
    Invoke {
        skill: String,
        args: HashMap<String, Value>,
    },
    /// The model output could not be interpreted as either of the above.
    Unrecognized { raw: String },
}

/// A parsed routing decision plus the model's self-reported metadata.
#[derive(Clone, Debug)]
pub struct ActionDecision {
    pub action: Action,
    pub explanation: Option<String>,
    pub confidence: Option<f64>,
    pub warnings: Vec<String>,
}

impl ActionDecision {
    /// Parse a raw model reply into a decision.
    ///
    /// Extracts the first `{...}` block and interprets the protocol:
    /// `{"skill": "speak", "args": {"text": ...}}` is conversational;
    /// any other `skill` string is an invocation. Missing or malformed
    /// JSON, or JSON without a `skill` string, yields `Unrecognized`.
    pub fn parse(raw: &str) -> Self {
        let Some(json_str) = extract_json(raw) else {
            return Self::unrecognized(raw);
        };

        let Ok(value) = serde_json::from_str::<Value>(&json_str) else {
            return Self::unrecognized(raw);
        };

        let Some(skill) = value.get("skill").and_then(Value::as_str) else {
            return Self::unrecognized(raw);
        };

        let args: HashMap<String, Value> = value
            .get("args")
            .and_then(Value::as_object)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        let explanation = value
            .get("explanation")
            .and_then(Value::as_str)
            .map(String::from);
        let confidence = value.get("confidence_score").and_then(Value::as_f64);
        let warnings = value
            .get("warnings")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let action = if skill == "speak" {
            let text = args
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Action::Speak { text }
        } else {
            Action::Invoke {
                skill: skill.to_string(),
                args,
            }
        };

        Self {
            action,
            explanation,
            confidence,
            warnings,
        }
    }

    fn unrecognized(raw: &str) -> Self {
        Self {
            action: Action::Unrecognized {
                raw: raw.to_string(),
            },
            explanation: None,
            confidence: None,
            warnings: Vec::new(),
        }
    }
}

/// Extract the first brace-delimited JSON object from model output.
///
/// Models often wrap JSON in prose or markdown fences; this grabs the
/// outermost `{...}` span (greedy, across newlines).
pub fn extract_json(text: &str) -> Option<String> {
    // Compiled per call; routing happens at human interaction rates.
    let re = Regex::new(r"(?s)\{.*\}").ok()?;
    re.find(text).map(|m| m.as_str().to_string())
}

// ─────────────────────────────────────────────
// Interaction records
// ─────────────────────────────────────────────

/// Write-once record of one dispatcher turn, for /status and feedback.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub user_name: String,
    pub input: String,
    /// Chosen action: `"speak"`, the skill name, or `"unrecognized"`.
    pub action: String,
    #[serde(default)]
    pub args: HashMap<String, Value>,
    pub explanation: Option<String>,
    pub confidence: Option<f64>,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Short summary of what was said or done.
    pub response_summary: String,
    pub success: bool,
    /// User feedback: +1 thumbs up, -1 thumbs down, None unset.
    pub feedback: Option<i8>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
