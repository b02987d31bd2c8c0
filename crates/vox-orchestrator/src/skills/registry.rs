//! Skill registry — explicit registration, lookup, and the prompt catalog.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::base::Skill;

/// Maps skill names to implementations. Registration is explicit; there is
/// no discovery or reflection.
#[derive(Default)]
pub struct SkillRegistry {
    skills: HashMap<String, Arc<dyn Skill>>,
    order: Vec<String>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a skill. Re-registering a name replaces the old entry.
    pub fn register(&mut self, skill: Arc<dyn Skill>) {
        let name = skill.name().to_string();
        if self.skills.insert(name.clone(), skill).is_some() {
            warn!(skill = %name, "Replacing existing skill registration");
        } else {
            debug!(skill = %name, "Registered skill");
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Skill>> {
        self.skills.get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.skills.contains_key(name)
    }

    /// Skill names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// One line per skill for the routing prompt: name, first description
    /// line, and parameter names.
    pub fn prompt_catalog(&self) -> String {
        let mut lines = Vec::with_capacity(self.order.len());
        for name in &self.order {
            let Some(skill) = self.skills.get(name) else {
                continue;
            };
            let first_line = skill.description().lines().next().unwrap_or_default();
            let params = parameter_names(&skill.parameters());
            if params.is_empty() {
                lines.push(format!("- {name}: {first_line}"));
            } else {
                lines.push(format!("- {name}: {first_line} (args: {})", params.join(", ")));
            }
        }
        lines.join("\n")
    }
}

/// Pull property names out of a JSON-schema object.
fn parameter_names(schema: &Value) -> Vec<String> {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
