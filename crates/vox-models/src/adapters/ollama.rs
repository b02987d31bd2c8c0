//! Ollama adapter — local `/api/chat` endpoint, no authentication.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use vox_core::config::{AdapterConfig, ProviderConfig};

use crate::adapters::{build_client, error_body, transport_error};
use crate::rate_limit::RateLimitTracker;
use crate::traits::{GenerateError, Generation, ModelAdapter};

const DEFAULT_API_BASE: &str = "http://localhost:11434";

pub struct OllamaAdapter {
    client: reqwest::Client,
    api_base: String,
    config: AdapterConfig,
    tracker: Mutex<RateLimitTracker>,
}

impl OllamaAdapter {
    pub fn new(config: AdapterConfig, provider: &ProviderConfig) -> Self {
        let api_base = provider
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let tracker = Mutex::new(RateLimitTracker::new(config.rate_per_minute));
        Self {
            client: build_client(),
            api_base,
            config,
            tracker,
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.api_base.trim_end_matches('/'))
    }
}

// ── Wire types ──

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<WireMessage>,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[async_trait]
impl ModelAdapter for OllamaAdapter {
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
            stream: false,
        };

        debug!(model = %self.config.model_id, "Calling Ollama");

        let response = self
            .client
            .post(self.chat_url())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        // Ollama answers 404 when the model hasn't been pulled yet
        if status.as_u16() == 404 {
            return Err(GenerateError::NotReady(error_body(response).await));
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
            if text.contains("not found") {
                return Err(GenerateError::NotReady(text));
            }
            error!(model = %self.config.model_id, status = %status, body = %text, "Ollama API error");
            return Err(GenerateError::Unexpected(format!("{} — {}", status, text)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Unexpected(format!("invalid Ollama response: {e}")))?;

        let text = parsed
            .message
            .map(|m| m.content)
            .ok_or_else(|| GenerateError::Unexpected("Ollama response had no message".to_string()))?;

        Ok(Generation {
            text,
            prompt_tokens: parsed.prompt_eval_count,
            response_tokens: parsed.eval_count,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
