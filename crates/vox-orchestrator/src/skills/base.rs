//! The `Skill` trait — one named capability the router can dispatch to.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::speech::SpeechHandle;

/// Shared context handed to every skill invocation.
#[derive(Clone)]
pub struct SkillContext {
    /// Speech output queue; skills talk to the user through this.
    pub speech: SpeechHandle,
    /// Name of the active user.
    pub user_name: String,
}

/// A named capability with a JSON-schema parameter description.
///
/// `invoke` reports failure either way: `Err(_)` for an internal error,
/// `Ok(false)` for a handled-but-unsuccessful run. The dispatcher contains
/// both and never crashes on a failing skill.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Unique skill name, as the routing model must emit it.
    fn name(&self) -> &str;

    /// Human-readable description. The first line goes into the prompt.
    fn description(&self) -> &str;

    /// JSON schema of the accepted arguments.
    fn parameters(&self) -> Value;

    /// Run the skill.
    async fn invoke(
        &self,
        ctx: &SkillContext,
        args: HashMap<String, Value>,
    ) -> anyhow::Result<bool>;
}
