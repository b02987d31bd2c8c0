//! Provider adapters — one module per backend, all mapping onto the shared
//! `GenerateError` taxonomy.

pub mod anthropic;
pub mod gemini;
pub mod groq;
pub mod ollama;
pub mod stub;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use groq::GroqAdapter;
pub use ollama::OllamaAdapter;
pub use stub::StubAdapter;

use crate::traits::GenerateError;

/// Shared HTTP client for adapters.
pub(crate) fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .expect("Failed to build HTTP client")
}

/// Map a reqwest transport error onto the taxonomy.
///
/// Connection refusals and timeouts are transient unavailability; anything
/// else (TLS, malformed URL) is unexpected.
pub(crate) fn transport_error(e: reqwest::Error) -> GenerateError {
    if e.is_connect() || e.is_timeout() {
        GenerateError::Unavailable(e.to_string())
    } else {
        GenerateError::Unexpected(e.to_string())
    }
}

/// Read an error body for logging, tolerating read failures.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string())
}
