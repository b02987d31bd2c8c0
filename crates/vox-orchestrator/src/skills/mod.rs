//! Skill system — the trait skills implement and the explicit registry the
//! dispatcher resolves them from.

pub mod base;
pub mod registry;

pub use base::{Skill, SkillContext};
pub use registry::SkillRegistry;
