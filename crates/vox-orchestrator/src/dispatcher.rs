//! Command dispatcher — one user turn at a time through the confirmation
//! state machine.
//!
//! States: `Idle → Thinking → {Executing | AwaitingConfirmation |
//! RateLimited} → Idle`. A pending confirmation blocks new commands until
//! the user resolves it. Every failure path speaks exactly one user-safe
//! sentence; raw errors only reach the logs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use vox_core::config::schema::AssistantConfig;
use vox_core::config::QuotaConfig;
use vox_core::types::{Action, ActionDecision, InteractionRecord};
use vox_models::{generate_with_retry, ModelRegistry, ModelRouter};

use crate::prompt::{compose_routing_prompt, strip_wake_phrase};
use crate::quota::QuotaTracker;
use crate::sentiment::Sentiment;
use crate::skills::{SkillContext, SkillRegistry};
use crate::speech::SpeechHandle;

const EXIT_COMMANDS: &[&str] = &["exit", "quit", "goodbye", "bye", "stop"];
const YES_WORDS: &[&str] = &["yes", "yeah", "yep", "sure", "ok", "okay", "please do", "go ahead"];
const NO_WORDS: &[&str] = &["no", "nope", "nah", "no thanks", "cancel", "don't"];

/// Observable dispatcher state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Thinking,
    Executing,
    AwaitingConfirmation,
    RateLimited,
}

/// What kind of turn just finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnKind {
    /// Something was spoken or a skill ran.
    Responded,
    /// The dispatcher asked for confirmation and is waiting.
    AwaitingConfirmation,
    /// Blocked by the session quota; no adapter was called.
    RateLimited,
    /// The user asked to exit.
    Exit,
    /// Empty input or dispatcher already shut down.
    Ignored,
}

/// Result of one `handle_input` turn.
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub kind: TurnKind,
    /// What was said to the user this turn.
    pub message: String,
    /// Short summary for the API surface.
    pub summary: String,
    pub interaction_id: Option<u64>,
}

impl TurnOutcome {
    fn new(kind: TurnKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let summary = vox_core::utils::truncate_string(&message, 80);
        Self {
            kind,
            message,
            summary,
            interaction_id: None,
        }
    }

    fn with_id(mut self, id: u64) -> Self {
        self.interaction_id = Some(id);
        self
    }
}

struct PendingConfirmation {
    /// The cleaned input that failed to route; becomes the fallback query.
    original_input: String,
}

/// The orchestration core: wake-phrase handling, quota gate, model routing,
/// decision parsing, skill dispatch, and interaction records.
pub struct Dispatcher {
    assistant: AssistantConfig,
    router: ModelRouter,
    quota: Mutex<QuotaTracker>,
    skills: Arc<SkillRegistry>,
    speech: SpeechHandle,
    user_name: String,
    state: Mutex<DispatcherState>,
    pending: Mutex<Option<PendingConfirmation>>,
    records: Mutex<Vec<InteractionRecord>>,
    next_id: AtomicU64,
    running: AtomicBool,
}

impl Dispatcher {
    pub fn new(
        assistant: AssistantConfig,
        registry: Arc<ModelRegistry>,
        quota_limits: QuotaConfig,
        skills: Arc<SkillRegistry>,
        speech: SpeechHandle,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            assistant,
            router: ModelRouter::new(registry),
            quota: Mutex::new(QuotaTracker::new(quota_limits, Utc::now())),
            skills,
            speech,
            user_name: user_name.into(),
            state: Mutex::new(DispatcherState::Idle),
            pending: Mutex::new(None),
            records: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            running: AtomicBool::new(true),
        }
    }

    /// Current state, for /status.
    pub fn state(&self) -> DispatcherState {
        *lock(&self.state)
    }

    /// Whether the dispatcher still accepts turns.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Refuse new turns from now on. In-flight turns finish normally.
    pub fn shutdown(&self) {
        info!("Dispatcher shutting down");
        self.running.store(false, Ordering::SeqCst);
    }

    /// Name of the active user.
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Current quota readings as (rpm, tpm, daily, limits).
    pub fn quota_snapshot(&self) -> (u32, u32, u32, QuotaConfig) {
        let mut quota = lock(&self.quota);
        let now = Utc::now();
        (
            quota.current_rpm(now),
            quota.current_tpm(now),
            quota.daily_count(),
            quota.limits().clone(),
        )
    }

    /// Attach user feedback to a past interaction. Returns false for an
    /// unknown id.
    pub fn record_feedback(&self, id: u64, feedback: i8) -> bool {
        let mut records = lock(&self.records);
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.feedback = Some(feedback.signum());
                info!(interaction = id, feedback, "Recorded user feedback");
                true
            }
            None => false,
        }
    }

    /// Number of interactions recorded this session.
    pub fn interaction_count(&self) -> usize {
        lock(&self.records).len()
    }

    /// Process one user turn.
    pub async fn handle_input(&self, raw_input: &str) -> TurnOutcome {
        if !self.is_running() {
            debug!("Dispatcher is shut down, refusing input");
            return TurnOutcome::new(TurnKind::Ignored, "");
        }

        // A pending confirmation consumes this input first.
        if lock(&self.pending).is_some() {
            return self.resolve_confirmation(raw_input).await;
        }

        let (cleaned, wake_detected) =
            strip_wake_phrase(raw_input, &self.assistant.wake_phrases);
        debug!(wake_detected, input = %cleaned, "Turn started");

        if cleaned.is_empty() {
            self.set_state(DispatcherState::Idle);
            return TurnOutcome::new(TurnKind::Ignored, "");
        }

        if EXIT_COMMANDS.contains(&cleaned.to_lowercase().as_str()) {
            let farewell = format!("Goodbye, {}!", self.user_name);
            self.speech.say(farewell.clone());
            self.set_state(DispatcherState::Idle);
            return TurnOutcome::new(TurnKind::Exit, farewell);
        }

        self.set_state(DispatcherState::Thinking);

        // Session quota gate, before any adapter is touched.
        if let Err(e) = lock(&self.quota).can_proceed(Utc::now()) {
            warn!(error = %e, "Turn blocked by session quota");
            self.set_state(DispatcherState::RateLimited);
            let message = format!("I have to slow down: {e}.");
            self.speech.say(message.clone());
            self.set_state(DispatcherState::Idle);
            return TurnOutcome::new(TurnKind::RateLimited, message);
        }

        let sentiment = Sentiment::classify(&cleaned);
        let prompt =
            compose_routing_prompt(&self.assistant.name, sentiment, &self.skills, &cleaned);

        let adapter = match self
            .router
            .select_model(&self.assistant.routing_task, Instant::now())
        {
            Ok(adapter) => adapter,
            Err(e) => {
                error!(error = %e, "Routing failed");
                return self.fail_turn(&cleaned, "routing_error",
                    "I can't reach any of my language models right now.");
            }
        };

        let generation = match generate_with_retry(adapter.as_ref(), &prompt).await {
            Ok(g) => g,
            Err(e) => {
                error!(model = %adapter.config().model_id, error = %e, "Model call failed");
                return self.fail_turn(&cleaned, "model_error",
                    "I'm having trouble thinking right now, please try again in a moment.");
            }
        };

        {
            let mut quota = lock(&self.quota);
            let now = Utc::now();
            quota.record_usage(now, generation.prompt_tokens, generation.response_tokens);
            if quota.tpm_exceeded(now) {
                warn!(
                    tpm = quota.current_tpm(now),
                    ceiling = quota.limits().tpm,
                    "Token-per-minute ceiling exceeded"
                );
            }
        }

        let decision = ActionDecision::parse(&generation.text);
        self.act_on_decision(&cleaned, decision).await
    }

    // ── Turn stages ──

    async fn act_on_decision(&self, cleaned: &str, decision: ActionDecision) -> TurnOutcome {
        match decision.action.clone() {
            Action::Speak { text } => {
                self.speech.say(text.clone());
                let id = self.append_record(cleaned, "speak", HashMap::new(), &decision, &text, true);
                self.set_state(DispatcherState::Idle);
                TurnOutcome::new(TurnKind::Responded, text).with_id(id)
            }
            Action::Invoke { skill, args } if self.skills.has(&skill) => {
                self.set_state(DispatcherState::Executing);
                let (message, success) = self.run_skill(&skill, args.clone()).await;
                let id = self.append_record(cleaned, &skill, args, &decision, &message, success);
                self.set_state(DispatcherState::Idle);
                TurnOutcome::new(TurnKind::Responded, message).with_id(id)
            }
            Action::Invoke { skill, .. } => {
                debug!(skill = %skill, "Routing model chose an unknown skill");
                self.offer_fallback(cleaned, &decision)
            }
            Action::Unrecognized { raw } => {
                debug!(raw = %vox_core::utils::truncate_string(&raw, 120), "Unparsable routing decision");
                self.offer_fallback(cleaned, &decision)
            }
        }
    }

    async fn run_skill(&self, name: &str, args: HashMap<String, Value>) -> (String, bool) {
        let Some(skill) = self.skills.get(name) else {
            // Guarded by the caller; kept as a safety net.
            return ("I lost track of that skill.".to_string(), false);
        };

        let ctx = SkillContext {
            speech: self.speech.clone(),
            user_name: self.user_name.clone(),
        };

        info!(skill = %name, "Invoking skill");
        match skill.invoke(&ctx, args).await {
            Ok(true) => (format!("Done, I ran {name} for you."), true),
            Ok(false) => {
                warn!(skill = %name, "Skill reported failure");
                let message = format!("I tried {name}, but it didn't work out.");
                self.speech.say(message.clone());
                (message, false)
            }
            Err(e) => {
                error!(skill = %name, error = %e, "Skill invocation errored");
                let message = format!("Something went wrong while running {name}.");
                self.speech.say(message.clone());
                (message, false)
            }
        }
    }

    /// Store a pending confirmation and offer the fallback skill.
    fn offer_fallback(&self, cleaned: &str, decision: &ActionDecision) -> TurnOutcome {
        let message = "I'm not sure how to handle that. Should I try searching the web?".to_string();
        self.speech.say(message.clone());
        let id = self.append_record(
            cleaned,
            "unrecognized",
            HashMap::new(),
            decision,
            &message,
            false,
        );
        *lock(&self.pending) = Some(PendingConfirmation {
            original_input: cleaned.to_string(),
        });
        self.set_state(DispatcherState::AwaitingConfirmation);
        TurnOutcome::new(TurnKind::AwaitingConfirmation, message).with_id(id)
    }

    /// Resolve a stored confirmation with the new input.
    async fn resolve_confirmation(&self, raw_input: &str) -> TurnOutcome {
        let answer = raw_input.trim().to_lowercase();
        let is_yes = YES_WORDS.iter().any(|w| answer == *w || answer.starts_with(&format!("{w} ")));
        let is_no = NO_WORDS.iter().any(|w| answer == *w || answer.starts_with(&format!("{w} ")));

        let Some(pending) = lock(&self.pending).take() else {
            // Raced with another resolver; treat as a fresh Idle turn.
            self.set_state(DispatcherState::Idle);
            return TurnOutcome::new(TurnKind::Ignored, "");
        };

        if is_yes {
            info!("Confirmation accepted, running fallback skill");
            self.set_state(DispatcherState::Executing);
            let fallback = self.assistant.fallback_skill.clone();
            let mut args = HashMap::new();
            args.insert(
                "query".to_string(),
                Value::String(pending.original_input.clone()),
            );
            let (message, success) = self.run_skill(&fallback, args.clone()).await;
            let decision = ActionDecision {
                action: Action::Invoke {
                    skill: fallback.clone(),
                    args: args.clone(),
                },
                explanation: None,
                confidence: None,
                warnings: Vec::new(),
            };
            let id = self.append_record(
                &pending.original_input,
                &fallback,
                args,
                &decision,
                &message,
                success,
            );
            self.set_state(DispatcherState::Idle);
            return TurnOutcome::new(TurnKind::Responded, message).with_id(id);
        }

        if !is_no {
            // Unrelated input while awaiting confirmation counts as a decline.
            warn!(input = %answer, "Ambiguous confirmation reply, treating as no");
        }
        let message = "Okay, I'll leave it.".to_string();
        self.speech.say(message.clone());
        self.set_state(DispatcherState::Idle);
        TurnOutcome::new(TurnKind::Responded, message)
    }

    /// Speak one user-safe sentence and return to Idle.
    fn fail_turn(&self, cleaned: &str, action: &str, message: &str) -> TurnOutcome {
        self.speech.say(message.to_string());
        let decision = ActionDecision {
            action: Action::Unrecognized {
                raw: String::new(),
            },
            explanation: None,
            confidence: None,
            warnings: Vec::new(),
        };
        let id = self.append_record(cleaned, action, HashMap::new(), &decision, message, false);
        self.set_state(DispatcherState::Idle);
        TurnOutcome::new(TurnKind::Responded, message).with_id(id)
    }

    fn append_record(
        &self,
        input: &str,
        action: &str,
        args: HashMap<String, Value>,
        decision: &ActionDecision,
        response: &str,
        success: bool,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = InteractionRecord {
            id,
            timestamp: Utc::now(),
            user_name: self.user_name.clone(),
            input: input.to_string(),
            action: action.to_string(),
            args,
            explanation: decision.explanation.clone(),
            confidence: decision.confidence,
            warnings: decision.warnings.clone(),
            response_summary: vox_core::utils::truncate_string(response, 120),
            success,
            feedback: None,
        };
        lock(&self.records).push(record);
        id
    }

    fn set_state(&self, state: DispatcherState) {
        *lock(&self.state) = state;
    }
}

/// Lock a mutex, recovering from poisoning. Dispatcher state stays
/// internally consistent because every update is a single assignment or
/// push.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
