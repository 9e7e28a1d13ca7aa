//! Configuration loading, validation, and management for PersonaChat.
//!
//! Loads configuration from `~/.personachat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

pub mod catalog;

pub use catalog::{Catalog, Persona};

use personachat_core::window::MemoryLength;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.personachat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// File holding the API key, e.g. a mounted container secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_file: Option<String>,

    /// Completion provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Model selected when the UI does not choose one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default nucleus sampling cutoff
    #[serde(default = "default_top_p")]
    pub default_top_p: f32,

    /// Trailing turns included in each prompt (1–10)
    #[serde(default = "default_memory_length")]
    pub default_memory_length: usize,

    /// Max tokens per answer; unset leaves it to the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// Stop sequences sent with every request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,

    /// Line-delimited file of starter questions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter_questions: Option<String>,

    /// Selectable model identifiers
    #[serde(default = "catalog::default_models")]
    pub models: Vec<String>,

    /// Selectable personas
    #[serde(default = "catalog::default_personas")]
    pub personas: Vec<Persona>,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    1.0
}
fn default_memory_length() -> usize {
    MemoryLength::DEFAULT.get()
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
            .field("api_key_file", &self.api_key_file)
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_top_p", &self.default_top_p)
            .field("default_memory_length", &self.default_memory_length)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("stop", &self.stop)
            .field("models", &self.models)
            .field("personas", &self.personas.len())
            .field("starter_questions", &self.starter_questions)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub allow_public_bind: bool,
}

fn default_port() -> u16 {
    8501
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allow_public_bind: false,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.personachat/config.toml),
    /// or from `PERSONACHAT_CONFIG` when set.
    ///
    /// Also checks environment variables for API keys:
    /// - `PERSONACHAT_API_KEY` (highest priority)
    /// - `GROQ_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("PERSONACHAT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_path());
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("PERSONACHAT_API_KEY")
                .ok()
                .or_else(|| std::env::var("GROQ_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .filter(|key| !key.trim().is_empty());
        }

        if let Ok(provider) = std::env::var("PERSONACHAT_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("PERSONACHAT_MODEL") {
            if !config.models.contains(&model) {
                config.models.insert(0, model.clone());
            }
            config.default_model = model;
        }

        config.validate()?;
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
        dirs_home().join(".personachat")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.default_top_p) {
            return Err(ConfigError::ValidationError(
                "default_top_p must be between 0.0 and 1.0".into(),
            ));
        }

        MemoryLength::new(self.default_memory_length)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.models.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one model must be configured".into(),
            ));
        }

        if !self.models.contains(&self.default_model) {
            return Err(ConfigError::ValidationError(format!(
                "default_model '{}' is not in the models list",
                self.default_model
            )));
        }

        if self.personas.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one persona must be configured".into(),
            ));
        }

        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.port must be non-zero".into(),
            ));
        }

        Ok(())
    }

    /// Resolve the API key from config, environment, or key file.
    ///
    /// A missing key is fatal: callers abort startup on this error.
    pub fn require_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.trim().to_string());
        }

        if let Some(path) = &self.api_key_file {
            let key = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                path: PathBuf::from(path),
                reason: e.to_string(),
            })?;
            let key = key.trim();
            if !key.is_empty() {
                return Ok(key.to_string());
            }
        }

        Err(ConfigError::MissingApiKey)
    }

    /// Check if an API key is available without reading any file.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.api_key_file.is_some()
    }

    /// Default memory length as a validated value.
    pub fn memory_length(&self) -> MemoryLength {
        MemoryLength::new(self.default_memory_length).unwrap_or_default()
    }

    /// Build the persona/model lookup table.
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.personas.clone(), self.models.clone())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_file: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_top_p: default_top_p(),
            default_memory_length: default_memory_length(),
            default_max_tokens: None,
            stop: Vec::new(),
            models: catalog::default_models(),
            personas: catalog::default_personas(),
            starter_questions: None,
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
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

    #[error(
        "No API key configured: set PERSONACHAT_API_KEY or GROQ_API_KEY, or api_key / api_key_file in config.toml"
    )]
    MissingApiKey,
}
