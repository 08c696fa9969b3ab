//! Configuration loading, validation, and management for Sous.
//!
//! Loads configuration from `~/.sous/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.sous/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the chat backend (local backends ignore it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible `/v1` endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per response (backend default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// HTTP timeout for a whole request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Conversation loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Completion cue settings
    #[serde(default)]
    pub notification: NotificationConfig,
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".into()
}
fn default_model() -> String {
    "qwen3:14b".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_request_timeout_secs() -> u64 {
    600
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
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("agent", &self.agent)
            .field("notification", &self.notification)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Compact once the conversation holds more than this many messages
    #[serde(default = "default_compaction_threshold")]
    pub compaction_threshold: usize,

    /// Fragment that opens a reasoning segment
    #[serde(default = "default_reasoning_open")]
    pub reasoning_open: String,

    /// Fragment that closes a reasoning segment
    #[serde(default = "default_reasoning_close")]
    pub reasoning_close: String,

    /// Keep reasoning text in the persisted assistant message
    #[serde(default)]
    pub persist_reasoning: bool,
}

fn default_compaction_threshold() -> usize {
    10
}
fn default_reasoning_open() -> String {
    "<think>".into()
}
fn default_reasoning_close() -> String {
    "</think>".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            compaction_threshold: default_compaction_threshold(),
            reasoning_open: default_reasoning_open(),
            reasoning_close: default_reasoning_close(),
            persist_reasoning: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Program and arguments run after each final answer,
    /// e.g. `["mpv", "/usr/share/sounds/done.mp3"]`
    #[serde(default)]
    pub command: Vec<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.sous/config.toml).
    ///
    /// Environment variables override the file:
    /// - `SOUS_API_KEY`, then `OPENAI_API_KEY` (only if no key is configured)
    /// - `SOUS_BASE_URL`
    /// - `SOUS_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
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

    /// Apply environment overrides through a lookup function.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("SOUS_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(base_url) = lookup("SOUS_BASE_URL") {
            self.base_url = base_url;
        }

        if let Some(model) = lookup("SOUS_MODEL") {
            self.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".sous")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.compaction_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "agent.compaction_threshold must be at least 1".into(),
            ));
        }

        if self.agent.reasoning_open.trim().is_empty()
            || self.agent.reasoning_close.trim().is_empty()
        {
            return Err(ConfigError::ValidationError(
                "reasoning markers must not be blank".into(),
            ));
        }

        if self.notification.enabled && self.notification.command.is_empty() {
            return Err(ConfigError::ValidationError(
                "notification.command is required when notifications are enabled".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `sous config --default`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            request_timeout_secs: default_request_timeout_secs(),
            agent: AgentConfig::default(),
            notification: NotificationConfig::default(),
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
