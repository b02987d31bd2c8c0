//! Model layer for Vox — provider adapters behind a shared trait, per-adapter
//! rate limiting, bounded retry with cooperative throttling, and a
//! capability-tag router over a static task-profile table.

pub mod adapters;
pub mod rate_limit;
pub mod registry;
pub mod retry;
pub mod router;
pub mod tasks;
pub mod traits;

pub use rate_limit::RateLimitTracker;
pub use registry::ModelRegistry;
pub use retry::generate_with_retry;
pub use router::{ModelRouter, RouteError};
pub use traits::{GenerateError, Generation, ModelAdapter};
