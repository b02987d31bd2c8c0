//! Configuration schema — typed model descriptors, provider credentials,
//! quota ceilings, and assistant behavior knobs.
//!
//! Hierarchy: `Config` → `AssistantConfig`, `Vec<AdapterConfig>`,
//! `ProvidersConfig`, `QuotaConfig`, `GatewayConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.vox/config.json` + env vars.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub assistant: AssistantConfig,
    /// One descriptor per model backend; read once at startup, immutable.
    pub models: Vec<AdapterConfig>,
    pub providers: ProvidersConfig,
    pub quota: QuotaConfig,
    pub gateway: GatewayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assistant: AssistantConfig::default(),
            models: default_models(),
            providers: ProvidersConfig::default(),
            quota: QuotaConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// A sensible two-model starter set so a fresh install can route.
fn default_models() -> Vec<AdapterConfig> {
    vec![
        AdapterConfig {
            model_id: "gemini-flash".into(),
            provider: "google".into(),
            backend_model_name: "gemini-1.5-flash".into(),
            rate_per_minute: 15,
            capability_tags: vec!["fast".into(), "chat".into(), "efficient".into()],
        },
        AdapterConfig {
            model_id: "claude-sonnet".into(),
            provider: "anthropic".into(),
            backend_model_name: "claude-sonnet-4-20250514".into(),
            rate_per_minute: 50,
            capability_tags: vec![
                "powerful".into(),
                "complex-reasoning".into(),
                "large-context".into(),
                "strong-coding".into(),
            ],
        },
    ]
}

// ─────────────────────────────────────────────
// Assistant behavior
// ─────────────────────────────────────────────

/// Persona and dispatcher behavior settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistantConfig {
    /// Spoken/printed persona name.
    pub name: String,
    /// Wake phrases stripped (case-insensitively) from the start of input.
    pub wake_phrases: Vec<String>,
    /// Skill invoked when the user confirms the generic fallback offer.
    pub fallback_skill: String,
    /// Task profile the dispatcher routes its own model calls with.
    pub routing_task: String,
    /// Seconds of silence before a proactive check-in.
    pub inactivity_threshold_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: "Vox".to_string(),
            wake_phrases: vec![
                "hey vox".to_string(),
                "okay vox".to_string(),
                "vox".to_string(),
            ],
            fallback_skill: "web_search".to_string(),
            routing_task: "command_routing".to_string(),
            inactivity_threshold_secs: 300,
        }
    }
}

// ─────────────────────────────────────────────
// Model descriptors
// ─────────────────────────────────────────────

/// Static descriptor for one model backend.
///
/// The registry instantiates exactly one adapter per descriptor.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfig {
    /// Unique identifier used for registry lookup (e.g. `"gemini-flash"`).
    pub model_id: String,
    /// Provider name: `"google"`, `"anthropic"`, `"groq"`, `"ollama"`.
    /// Anything else gets the always-failing stub adapter.
    pub provider: String,
    /// The model name the provider's API expects.
    pub backend_model_name: String,
    /// Client-side requests-per-minute cap. `0` = unlimited.
    #[serde(default)]
    pub rate_per_minute: u32,
    /// Capability tags matched against task profiles by the router.
    #[serde(default)]
    pub capability_tags: Vec<String>,
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Credentials + endpoint override for a single provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication (Ollama needs none).
    #[serde(default)]
    pub api_key: String,
    /// Custom API base URL (overrides the provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// All provider configurations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub google: ProviderConfig,
    #[serde(default)]
    pub anthropic: ProviderConfig,
    #[serde(default)]
    pub groq: ProviderConfig,
    #[serde(default)]
    pub ollama: ProviderConfig,
}

impl ProvidersConfig {
    /// Get a provider config by name (e.g. `"anthropic"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "google" => Some(&self.google),
            "anthropic" => Some(&self.anthropic),
            "groq" => Some(&self.groq),
            "ollama" => Some(&self.ollama),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────
// Quota ceilings
// ─────────────────────────────────────────────

/// Session-wide quota ceilings, checked before any adapter call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QuotaConfig {
    /// Requests per rolling minute.
    pub rpm: u32,
    /// Tokens per rolling minute (monitored post-call, never pre-checked).
    pub tpm: u32,
    /// Requests per UTC day.
    pub rpd: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        // Gemini 1.5 Flash free-tier ceilings.
        Self {
            rpm: 15,
            tpm: 1_000_000,
            rpd: 1500,
        }
    }
}

// ─────────────────────────────────────────────
// Gateway
// ─────────────────────────────────────────────

/// HTTP gateway configuration (`POST /command`, `GET /status`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8770,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
