//! Google Gemini adapter — `generateContent` REST API.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use vox_core::config::{AdapterConfig, ProviderConfig};

use crate::adapters::{build_client, error_body, transport_error};
use crate::rate_limit::RateLimitTracker;
use crate::traits::{GenerateError, Generation, ModelAdapter};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiAdapter {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    config: AdapterConfig,
    tracker: Mutex<RateLimitTracker>,
}

impl GeminiAdapter {
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

    fn generate_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!(
            "{}/v1beta/models/{}:generateContent",
            base, self.config.backend_model_name
        )
    }
}

// ── Wire types ──

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[async_trait]
impl ModelAdapter for GeminiAdapter {
    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn tracker(&self) -> &Mutex<RateLimitTracker> {
        &self.tracker
    }

    async fn generate(&self, prompt: &str) -> Result<Generation, GenerateError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        debug!(model = %self.config.model_id, "Calling Gemini");

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
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
            error!(model = %self.config.model_id, status = %status, body = %text, "Gemini API error");
            return Err(GenerateError::Unexpected(format!("{} — {}", status, text)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Unexpected(format!("invalid Gemini response: {e}")))?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Err(GenerateError::PromptRejected(reason));
        }

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| {
                GenerateError::Unexpected("Gemini response had no candidates".to_string())
            })?;

        let usage = parsed.usage_metadata.unwrap_or_default();
        Ok(Generation {
            text,
            prompt_tokens: usage.prompt_token_count,
            response_tokens: usage.candidates_token_count,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_adapter(base: &str) -> GeminiAdapter {
        GeminiAdapter::new(
            AdapterConfig {
                model_id: "gemini-flash".to_string(),
                provider: "google".to_string(),
                backend_model_name: "gemini-1.5-flash".to_string(),
                rate_per_minute: 15,
                capability_tags: vec!["fast".to_string()],
            },
            &ProviderConfig {
                api_key: "AIza-test".to_string(),
                api_base: Some(base.to_string()),
            },
        )
    }

    #[test]
    fn test_generate_url() {
        let adapter = make_adapter("https://example.com/");
        assert_eq!(
            adapter.generate_url(),
            "https://example.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "AIza-test"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": "hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"parts": [{"text": "Hi there!"}]}
                }],
                "usageMetadata": {
                    "promptTokenCount": 4,
                    "candidatesTokenCount": 3
                }
            })))
            .mount(&server)
            .await;

        let adapter = make_adapter(&server.uri());
        let result = adapter.generate("hello").await.unwrap();

        assert_eq!(result.text, "Hi there!");
        assert_eq!(result.prompt_tokens, 4);
        assert_eq!(result.response_tokens, 3);
    }

    #[tokio::test]
    async fn test_block_reason_is_prompt_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [],
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let adapter = make_adapter(&server.uri());
        let err = adapter.generate("bad prompt").await.unwrap_err();
        assert!(matches!(err, GenerateError::PromptRejected(r) if r == "SAFETY"));
    }

    #[tokio::test]
    async fn test_429_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let adapter = make_adapter(&server.uri());
        let err = adapter.generate("hello").await.unwrap_err();
        assert!(matches!(err, GenerateError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_500_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let adapter = make_adapter(&server.uri());
        let err = adapter.generate("hello").await.unwrap_err();
        assert!(matches!(err, GenerateError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_connect_failure_is_unavailable() {
        let adapter = make_adapter("http://127.0.0.1:1");
        let err = adapter.generate("hello").await.unwrap_err();
        assert!(matches!(err, GenerateError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_candidates_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .mount(&server)
            .await;

        let adapter = make_adapter(&server.uri());
        let err = adapter.generate("hello").await.unwrap_err();
        assert!(matches!(err, GenerateError::Unexpected(_)));
    }
}
