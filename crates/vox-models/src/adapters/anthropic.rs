//! Anthropic adapter — Messages API.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use vox_core::config::{AdapterConfig, ProviderConfig};

use crate::adapters::{build_client, error_body, transport_error};
use crate::rate_limit::RateLimitTracker;
use crate::traits::{GenerateError, Generation, ModelAdapter};

const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

pub struct AnthropicAdapter {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    config: AdapterConfig,
    tracker: Mutex<RateLimitTracker>,
}

impl AnthropicAdapter {
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

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.api_base.trim_end_matches('/'))
    }
}

// ── Wire types ──

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<WireMessage>,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[async_trait]
impl ModelAdapter for AnthropicAdapter {
    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn tracker(&self) -> &Mutex<RateLimitTracker> {
        &self.tracker
    }

    async fn generate(&self, prompt: &str) -> Result<Generation, GenerateError> {
        let body = MessagesRequest {
            model: self.config.backend_model_name.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        debug!(model = %self.config.model_id, "Calling Anthropic");

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GenerateError::RateLimited(error_body(response).await));
        }
        // 529 is Anthropic's "overloaded"
        if status.is_server_error() || status.as_u16() == 529 {
            return Err(GenerateError::Unavailable(format!(
                "{} — {}",
                status,
                error_body(response).await
            )));
        }
        if !status.is_success() {
            let text = error_body(response).await;
            error!(model = %self.config.model_id, status = %status, body = %text, "Anthropic API error");
            return Err(GenerateError::Unexpected(format!("{} — {}", status, text)));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Unexpected(format!("invalid Anthropic response: {e}")))?;

        let text = parsed
            .content
            .first()
            .map(|b| b.text.clone())
            .ok_or_else(|| {
                GenerateError::Unexpected("Anthropic response had no content".to_string())
            })?;

        let usage = parsed.usage.unwrap_or_default();
        Ok(Generation {
            text,
            prompt_tokens: usage.input_tokens,
            response_tokens: usage.output_tokens,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
