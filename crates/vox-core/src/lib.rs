//! Core building blocks for Vox — configuration, shared types, utilities.

pub mod config;
pub mod types;
pub mod utils;
