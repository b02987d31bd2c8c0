//! Orchestration layer for Vox — session quota tracking, prompt composition,
//! skill registry, the command dispatcher state machine, speech output, voice
//! capture scaffolding, and the inactivity monitor.

pub mod dispatcher;
pub mod inactivity;
pub mod prompt;
pub mod quota;
pub mod sentiment;
pub mod skills;
pub mod speech;
pub mod voice;

pub use dispatcher::{Dispatcher, DispatcherState, TurnKind, TurnOutcome};
pub use quota::{QuotaExceeded, QuotaTracker};
pub use skills::{Skill, SkillContext, SkillRegistry};
pub use speech::{ConsoleSpeaker, Speaker, SpeechHandle, SpeechWorker};
