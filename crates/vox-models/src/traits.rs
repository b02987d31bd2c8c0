//! The `ModelAdapter` trait and the shared error taxonomy.
//!
//! Every provider backend (Gemini, Anthropic, Groq, Ollama) implements this
//! trait. Transport-specific failures are mapped onto exactly five error
//! kinds so the retry and dispatch layers never inspect provider details.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use vox_core::config::AdapterConfig;

use crate::rate_limit::RateLimitTracker;

/// One completed generation: the text plus token accounting.
#[derive(Clone, Debug, PartialEq)]
pub struct Generation {
    pub text: String,
    pub prompt_tokens: u32,
    pub response_tokens: u32,
}

impl Generation {
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens + self.response_tokens
    }
}

/// The five-kind error taxonomy every adapter maps onto.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The provider refused the prompt itself (safety block, policy).
    #[error("prompt rejected by provider: {0}")]
    PromptRejected(String),

    /// The provider returned a rate-limit response (HTTP 429 or similar).
    #[error("provider rate limit hit: {0}")]
    RateLimited(String),

    /// The provider is temporarily down or overloaded (5xx, connect failure).
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The backend exists but cannot serve yet (model not pulled, loading).
    #[error("model not ready: {0}")]
    NotReady(String),

    /// Anything that doesn't fit the other four kinds.
    #[error("unexpected provider error: {0}")]
    Unexpected(String),
}

impl GenerateError {
    /// Whether the retry layer may try again. Only rate limiting and
    /// unavailability are transient; the other kinds repeat identically.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Unavailable(_))
    }
}

/// Trait that all model backends implement.
///
/// Adapters hold their own `RateLimitTracker`; the retry layer consults it
/// before each attempt and records every attempt that reaches the provider.
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// The static descriptor this adapter was built from.
    fn config(&self) -> &AdapterConfig;

    /// Per-adapter sliding-window tracker.
    fn tracker(&self) -> &Mutex<RateLimitTracker>;

    /// Send one prompt and return the generation.
    ///
    /// Implementations map transport errors onto `GenerateError` and never
    /// panic on malformed provider responses.
    async fn generate(&self, prompt: &str) -> Result<Generation, GenerateError>;
}

impl std::fmt::Debug for dyn ModelAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAdapter")
            .field("model_id", &self.config().model_id)
            .finish_non_exhaustive()
    }
}
