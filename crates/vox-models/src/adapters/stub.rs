//! Stub adapter for unrecognized provider names.
//!
//! Registered in place of a real backend so misconfiguration surfaces as a
//! visible error at call time instead of silently dropping the model.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::warn;

use vox_core::config::AdapterConfig;

use crate::rate_limit::RateLimitTracker;
use crate::traits::{GenerateError, Generation, ModelAdapter};

pub struct StubAdapter {
    config: AdapterConfig,
    tracker: Mutex<RateLimitTracker>,
}

impl StubAdapter {
    pub fn new(config: AdapterConfig) -> Self {
        let tracker = Mutex::new(RateLimitTracker::new(config.rate_per_minute));
        Self { config, tracker }
    }
}

#[async_trait]
impl ModelAdapter for StubAdapter {
    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn tracker(&self) -> &Mutex<RateLimitTracker> {
        &self.tracker
    }

    async fn generate(&self, _prompt: &str) -> Result<Generation, GenerateError> {
        warn!(
            model = %self.config.model_id,
            provider = %self.config.provider,
            "Stub adapter called for unknown provider"
        );
        Err(GenerateError::Unexpected(format!(
            "no adapter implementation for provider '{}'",
            self.config.provider
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_always_fails_unexpected() {
        let adapter = StubAdapter::new(AdapterConfig {
            model_id: "mystery".to_string(),
            provider: "nonexistent-cloud".to_string(),
            backend_model_name: "v1".to_string(),
            rate_per_minute: 0,
            capability_tags: vec![],
        });

        let err = adapter.generate("hello").await.unwrap_err();
        assert!(matches!(err, GenerateError::Unexpected(_)));
        assert!(err.to_string().contains("nonexistent-cloud"));
        assert!(!err.is_transient());
    }
}
