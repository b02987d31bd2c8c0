//! Config loader — reads `~/.vox/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.vox/config.json`
//! 3. Environment variables `VOX_<SECTION>__<FIELD>` (override JSON)
//!
//! Provider keys additionally honor the conventional variables
//! (`GEMINI_API_KEY`, `ANTHROPIC_API_KEY`, `GROQ_API_KEY`).

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    // Ensure parent directory exists
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `VOX_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `VOX_ASSISTANT__NAME` → `assistant.name`
/// - `VOX_ASSISTANT__INACTIVITY_THRESHOLD_SECS` → `assistant.inactivity_threshold_secs`
/// - `VOX_PROVIDERS__<NAME>__API_KEY` → `providers.<name>.api_key`
/// - `VOX_PROVIDERS__<NAME>__API_BASE` → `providers.<name>.api_base`
/// - `VOX_QUOTA__RPM` / `VOX_QUOTA__TPM` / `VOX_QUOTA__RPD` → `quota.*`
/// - `VOX_GATEWAY__HOST` / `VOX_GATEWAY__PORT` → `gateway.*`
///
/// Conventional provider keys (`GEMINI_API_KEY` etc.) are applied first,
/// so the `VOX_`-prefixed form wins when both are set.
fn apply_env_overrides(mut config: Config) -> Config {
    // Conventional provider key variables
    if let Ok(val) = std::env::var("GEMINI_API_KEY") {
        config.providers.google.api_key = val;
    }
    if let Ok(val) = std::env::var("ANTHROPIC_API_KEY") {
        config.providers.anthropic.api_key = val;
    }
    if let Ok(val) = std::env::var("GROQ_API_KEY") {
        config.providers.groq.api_key = val;
    }

    // Assistant
    if let Ok(val) = std::env::var("VOX_ASSISTANT__NAME") {
        config.assistant.name = val;
    }
    if let Ok(val) = std::env::var("VOX_ASSISTANT__INACTIVITY_THRESHOLD_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.assistant.inactivity_threshold_secs = n;
        }
    }
    if let Ok(val) = std::env::var("VOX_ASSISTANT__FALLBACK_SKILL") {
        config.assistant.fallback_skill = val;
    }

    // Provider API keys (by provider name)
    apply_provider_env(&mut config.providers.google, "GOOGLE");
    apply_provider_env(&mut config.providers.anthropic, "ANTHROPIC");
    apply_provider_env(&mut config.providers.groq, "GROQ");
    apply_provider_env(&mut config.providers.ollama, "OLLAMA");

    // Quota ceilings
    if let Ok(val) = std::env::var("VOX_QUOTA__RPM") {
        if let Ok(n) = val.parse::<u32>() {
            config.quota.rpm = n;
        }
    }
    if let Ok(val) = std::env::var("VOX_QUOTA__TPM") {
        if let Ok(n) = val.parse::<u32>() {
            config.quota.tpm = n;
        }
    }
    if let Ok(val) = std::env::var("VOX_QUOTA__RPD") {
        if let Ok(n) = val.parse::<u32>() {
            config.quota.rpd = n;
        }
    }

    // Gateway
    if let Ok(val) = std::env::var("VOX_GATEWAY__HOST") {
        config.gateway.host = val;
    }
    if let Ok(val) = std::env::var("VOX_GATEWAY__PORT") {
        if let Ok(p) = val.parse::<u16>() {
            config.gateway.port = p;
        }
    }

    config
}

/// Apply env var overrides for a single provider.
fn apply_provider_env(provider: &mut super::schema::ProviderConfig, name: &str) {
    if let Ok(val) = std::env::var(format!("VOX_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Ok(val) = std::env::var(format!("VOX_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        // Should return defaults
        assert_eq!(config.assistant.name, "Vox");
        assert_eq!(config.gateway.port, 8770);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
            "assistant": {
                "name": "Jarvis",
                "inactivityThresholdSecs": 60
            }
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.assistant.name, "Jarvis");
        assert_eq!(config.assistant.inactivity_threshold_secs, 60);
        // Default preserved
        assert_eq!(config.assistant.fallback_skill, "web_search");
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert_eq!(config.assistant.name, "Vox");
    }

    #[test]
    fn test_load_empty_json() {
        let file = write_temp_json("{}");
        let config = load_config_from_path(file.path());
        assert_eq!(config.quota.rpm, 15);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.assistant.name = "Echo".to_string();
        config.providers.anthropic.api_key = "sk-ant-test".to_string();

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.assistant.name, "Echo");
        assert_eq!(reloaded.providers.anthropic.api_key, "sk-ant-test");
    }

    #[test]
    fn test_env_override_assistant_name() {
        std::env::set_var("VOX_ASSISTANT__NAME", "TestVox");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.assistant.name, "TestVox");
        std::env::remove_var("VOX_ASSISTANT__NAME");
    }

    #[test]
    fn test_env_override_provider_key() {
        std::env::set_var("VOX_PROVIDERS__GROQ__API_KEY", "gsk-env-key");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.providers.groq.api_key, "gsk-env-key");
        std::env::remove_var("VOX_PROVIDERS__GROQ__API_KEY");
    }

    #[test]
    fn test_env_override_quota_rpm() {
        std::env::set_var("VOX_QUOTA__RPM", "3");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.quota.rpm, 3);
        std::env::remove_var("VOX_QUOTA__RPM");
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["assistant"].get("wakePhrases").is_some());
        assert!(raw["assistant"].get("wake_phrases").is_none());
    }

    #[test]
    fn test_full_config_with_providers() {
        let file = write_temp_json(
            r#"{
            "providers": {
                "google": { "apiKey": "AIza-123" },
                "ollama": { "apiBase": "http://localhost:11434" }
            },
            "models": [{
                "modelId": "flash",
                "provider": "google",
                "backendModelName": "gemini-1.5-flash",
                "ratePerMinute": 15,
                "capabilityTags": ["fast"]
            }]
        }"#,
        );

        let config = load_config_from_path(file.path());
        assert!(config.providers.google.is_configured());
        assert_eq!(
            config.providers.ollama.api_base.as_deref(),
            Some("http://localhost:11434")
        );
        assert!(!config.providers.groq.is_configured() || std::env::var("GROQ_API_KEY").is_ok());
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.models[0].model_id, "flash");
    }
}
