//! Inactivity monitor — proactive check-ins after a quiet spell.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use tracing::debug;

/// One proactive behavior with its selection weight.
struct Behavior {
    utterance: &'static str,
    weight: u32,
}

const BEHAVIORS: &[Behavior] = &[
    Behavior {
        utterance: "Is there anything I can help you with?",
        weight: 4,
    },
    Behavior {
        utterance: "Still here if you need me.",
        weight: 3,
    },
    Behavior {
        utterance: "You can ask me to search the web or set a timer, by the way.",
        weight: 2,
    },
    Behavior {
        utterance: "Quiet day, isn't it?",
        weight: 1,
    },
];

/// Tracks the last interaction and suggests one proactive utterance when
/// the configured threshold passes.
pub struct InactivityMonitor {
    threshold: Duration,
    last_interaction: Mutex<Instant>,
}

impl InactivityMonitor {
    pub fn new(threshold: Duration, now: Instant) -> Self {
        Self {
            threshold,
            last_interaction: Mutex::new(now),
        }
    }

    /// Record user activity.
    pub fn touch(&self, now: Instant) {
        *self.lock() = now;
    }

    /// Periodic check.
    ///
    /// Below threshold: nothing. Above threshold with a pending
    /// confirmation: reset the timer only, a proactive interruption would
    /// stomp on the open question. Otherwise: reset the timer and return a
    /// weighted-random utterance.
    pub fn check(&self, now: Instant, confirmation_pending: bool) -> Option<String> {
        {
            let last = self.lock();
            if now.saturating_duration_since(*last) < self.threshold {
                return None;
            }
        }

        self.touch(now);

        if confirmation_pending {
            debug!("Inactivity threshold passed while awaiting confirmation, timer reset only");
            return None;
        }

        let mut rng = rand::thread_rng();
        let behavior = BEHAVIORS
            .choose_weighted(&mut rng, |b| b.weight)
            .ok()?;
        debug!(utterance = behavior.utterance, "Proactive behavior chosen");
        Some(behavior.utterance.to_string())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Instant> {
        self.last_interaction
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
