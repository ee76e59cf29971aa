//! Configuration loading, validation, and management for Charloom.
//!
//! Loads configuration from `~/.charloom/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.charloom/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the generation service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Generation service settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Gateway (HTTP server) settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Context-adapter endpoints and timeouts
    #[serde(default)]
    pub adapters: AdaptersConfig,

    /// Conversation-state store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Prompt-composition settings
    #[serde(default)]
    pub prompt: PromptConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("generation", &self.generation)
            .field("gateway", &self.gateway)
            .field("adapters", &self.adapters)
            .field("store", &self.store)
            .field("prompt", &self.prompt)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// OpenAI-compatible API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature — high for creative roleplay variance
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum completion length in tokens
    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.9
}
fn default_max_completion_tokens() -> u32 {
    300
}
fn default_generation_timeout() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_completion_tokens: default_max_completion_tokens(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Endpoints for the optional context adapters. An unset endpoint disables
/// that adapter; the turn proceeds without its contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptersConfig {
    /// Per-adapter request timeout in seconds. Short by design — adapter
    /// unavailability must not stall the user-facing turn.
    #[serde(default = "default_adapter_timeout")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linguistic_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_url: Option<String>,
}

fn default_adapter_timeout() -> u64 {
    3
}

impl Default for AdaptersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_adapter_timeout(),
            emotion_url: None,
            sentiment_url: None,
            knowledge_url: None,
            linguistic_url: None,
            entity_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum tracked conversation keys before LRU eviction kicks in.
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,
}

fn default_max_conversations() -> usize {
    1024
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_conversations: default_max_conversations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// History truncation budget in word-units (a conservative proxy for
    /// tokens, kept under the generation service's context window).
    #[serde(default = "default_history_word_budget")]
    pub history_word_budget: usize,
}

fn default_history_word_budget() -> usize {
    8000
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            history_word_budget: default_history_word_budget(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.charloom/config.toml).
    ///
    /// Also checks environment variables:
    /// - `CHARLOOM_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `CHARLOOM_MODEL` overrides the model
    /// - `CHARLOOM_GENERATION_URL` overrides the base URL
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("CHARLOOM_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("CHARLOOM_MODEL") {
            config.generation.model = model;
        }

        if let Ok(url) = std::env::var("CHARLOOM_GENERATION_URL") {
            config.generation.base_url = url;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".charloom")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.temperature < 0.0 || self.generation.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.generation.max_completion_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "generation.max_completion_tokens must be > 0".into(),
            ));
        }

        if self.store.max_conversations == 0 {
            return Err(ConfigError::ValidationError(
                "store.max_conversations must be > 0".into(),
            ));
        }

        if self.prompt.history_word_budget == 0 {
            return Err(ConfigError::ValidationError(
                "prompt.history_word_budget must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            generation: GenerationConfig::default(),
            gateway: GatewayConfig::default(),
            adapters: AdaptersConfig::default(),
            store: StoreConfig::default(),
            prompt: PromptConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway.port, 8787);
        assert_eq!(config.prompt.history_word_budget, 8000);
        assert!((config.generation.temperature - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.generation.model, config.generation.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.store.max_conversations, config.store.max_conversations);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            generation: GenerationConfig {
                temperature: 5.0,
                ..GenerationConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_word_budget_rejected() {
        let config = AppConfig {
            prompt: PromptConfig {
                history_word_budget: 0,
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().generation.model, "gpt-4o-mini");
    }

    #[test]
    fn adapters_disabled_by_default() {
        let config = AppConfig::default();
        assert!(config.adapters.emotion_url.is_none());
        assert!(config.adapters.sentiment_url.is_none());
        assert_eq!(config.adapters.timeout_secs, 3);
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("8787"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[generation]
model = "gpt-4o"

[adapters]
emotion_url = "http://localhost:9100/emotion"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.generation.model, "gpt-4o");
        assert_eq!(config.generation.max_completion_tokens, 300);
        assert_eq!(
            config.adapters.emotion_url.as_deref(),
            Some("http://localhost:9100/emotion")
        );
        assert!(config.adapters.sentiment_url.is_none());
    }
}
