//! Groq adapter — OpenAI-compatible chat completions endpoint.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use vox_core::config::{AdapterConfig, ProviderConfig};

use crate::adapters::{build_client, error_body, transport_error};
use crate::rate_limit::RateLimitTracker;
use crate::traits::{GenerateError, Generation, ModelAdapter};

const DEFAULT_API_BASE: &str = "https://api.groq.com";

pub struct GroqAdapter {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    config: AdapterConfig,
    tracker: Mutex<RateLimitTracker>,
}

impl GroqAdapter {
    pub fn new(config: AdapterConfig, provider: &ProviderConfig) -> Self {
        let api_base = provider
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let tracker = Mutex::new(RateLimitTracker::new(config.rate_per_minute));
        Self {
            client: build_client(),
            api_base,
            api_key: provider.api_key.clone(),
            config,
            tracker,
        }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/v1/chat/completions",
            self.api_base.trim_end_matches('/')
        )
    }
}

// ── Wire types (OpenAI shape) ──

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[async_trait]
impl ModelAdapter for GroqAdapter {
    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn tracker(&self) -> &Mutex<RateLimitTracker> {
        &self.tracker
    }

    async fn generate(&self, prompt: &str) -> Result<Generation, GenerateError> {
        let body = ChatRequest {
            model: self.config.backend_model_name.clone(),
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        debug!(model = %self.config.model_id, "Calling Groq");

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GenerateError::RateLimited(error_body(response).await));
        }
        if status.is_server_error() {
            return Err(GenerateError::Unavailable(format!(
                "{} — {}",
                status,
                error_body(response).await
            )));
        }
        if !status.is_success() {
            let text = error_body(response).await;
            error!(model = %self.config.model_id, status = %status, body = %text, "Groq API error");
            return Err(GenerateError::Unexpected(format!("{} — {}", status, text)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Unexpected(format!("invalid Groq response: {e}")))?;

        let text = parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| GenerateError::Unexpected("Groq response had no choices".to_string()))?;

        let usage = parsed.usage.unwrap_or_default();
        Ok(Generation {
            text,
            prompt_tokens: usage.prompt_tokens,
            response_tokens: usage.completion_tokens,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
