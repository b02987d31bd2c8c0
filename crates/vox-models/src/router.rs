//! Capability-tag router — picks the best available adapter for a task.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::debug;

use crate::registry::ModelRegistry;
use crate::tasks::find_profile;
use crate::traits::ModelAdapter;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("unknown task '{0}'")]
    UnknownTask(String),

    /// Every candidate scored zero or is at its rate cap.
    #[error("no suitable adapter for task '{0}'")]
    NoSuitableAdapter(String),
}

/// Routes tasks to adapters by capability-tag overlap.
pub struct ModelRouter {
    registry: Arc<ModelRegistry>,
}

impl ModelRouter {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Select the best adapter for `task` at `now`.
    ///
    /// Adapters at or over their per-minute cap are skipped. Each remaining
    /// adapter scores by tag overlap with the task profile; the highest score
    /// wins, ties broken by the higher configured rate limit, then config
    /// order. Selection is idempotent while no request is recorded.
    pub fn select_model(
        &self,
        task: &str,
        now: Instant,
    ) -> Result<Arc<dyn ModelAdapter>, RouteError> {
        let profile =
            find_profile(task).ok_or_else(|| RouteError::UnknownTask(task.to_string()))?;

        let mut best: Option<(usize, u32, Arc<dyn ModelAdapter>)> = None;

        for adapter in self.registry.adapters() {
            let limited = adapter
                .tracker()
                .lock()
                .map(|mut t| t.is_exceeded(now))
                .unwrap_or(true);
            if limited {
                debug!(model = %adapter.config().model_id, task, "Skipping rate-limited adapter");
                continue;
            }

            let score = adapter
                .config()
                .capability_tags
                .iter()
                .filter(|tag| profile.preferred_tags.contains(&tag.as_str()))
                .count();
            if score == 0 {
                continue;
            }

            let cap = adapter.config().rate_per_minute;
            let better = match &best {
                None => true,
                Some((best_score, best_cap, _)) => {
                    score > *best_score || (score == *best_score && cap > *best_cap)
                }
            };
            if better {
                best = Some((score, cap, adapter.clone()));
            }
        }

        match best {
            Some((score, _, adapter)) => {
                debug!(
                    task,
                    model = %adapter.config().model_id,
                    score,
                    "Routed task to model"
                );
                Ok(adapter)
            }
            None => Err(RouteError::NoSuitableAdapter(task.to_string())),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
