//! Model registry — one adapter instance per configured descriptor.

use std::sync::Arc;

use tracing::{info, warn};

use vox_core::config::schema::ProvidersConfig;
use vox_core::config::{AdapterConfig, ProviderConfig};

use crate::adapters::{AnthropicAdapter, GeminiAdapter, GroqAdapter, OllamaAdapter, StubAdapter};
use crate::traits::ModelAdapter;

/// Holds all configured adapters, keyed by `model_id`.
///
/// Built once at startup; adapters are in config order, which makes router
/// tie-breaks deterministic.
pub struct ModelRegistry {
    adapters: Vec<Arc<dyn ModelAdapter>>,
}

impl ModelRegistry {
    /// Instantiate one adapter per descriptor.
    ///
    /// Unknown provider names get the stub adapter so the misconfiguration
    /// shows up at call time rather than disappearing.
    pub fn from_config(models: &[AdapterConfig], providers: &ProvidersConfig) -> Self {
        let mut adapters: Vec<Arc<dyn ModelAdapter>> = Vec::with_capacity(models.len());

        for descriptor in models {
            let provider_config = providers
                .get_by_name(&descriptor.provider)
                .cloned()
                .unwrap_or_else(ProviderConfig::default);

            let adapter: Arc<dyn ModelAdapter> = match descriptor.provider.as_str() {
                "google" => Arc::new(GeminiAdapter::new(descriptor.clone(), &provider_config)),
                "anthropic" => Arc::new(AnthropicAdapter::new(descriptor.clone(), &provider_config)),
                "groq" => Arc::new(GroqAdapter::new(descriptor.clone(), &provider_config)),
                "ollama" => Arc::new(OllamaAdapter::new(descriptor.clone(), &provider_config)),
                other => {
                    warn!(
                        model = %descriptor.model_id,
                        provider = %other,
                        "Unknown provider, registering stub adapter"
                    );
                    Arc::new(StubAdapter::new(descriptor.clone()))
                }
            };

            info!(
                model = %descriptor.model_id,
                provider = %descriptor.provider,
                rate_per_minute = descriptor.rate_per_minute,
                "Registered model adapter"
            );
            adapters.push(adapter);
        }

        Self { adapters }
    }

    /// Build a registry from pre-constructed adapters.
    ///
    /// Callers that implement `ModelAdapter` themselves (tests, embedders)
    /// use this instead of `from_config`.
    pub fn from_adapters(adapters: Vec<Arc<dyn ModelAdapter>>) -> Self {
        Self { adapters }
    }

    /// Look up an adapter by model id.
    pub fn get(&self, model_id: &str) -> Option<Arc<dyn ModelAdapter>> {
        self.adapters
            .iter()
            .find(|a| a.config().model_id == model_id)
            .cloned()
    }

    /// All adapters, in config order.
    pub fn adapters(&self) -> &[Arc<dyn ModelAdapter>] {
        &self.adapters
    }

    /// Registered model ids, in config order.
    pub fn model_ids(&self) -> Vec<String> {
        self.adapters
            .iter()
            .map(|a| a.config().model_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
