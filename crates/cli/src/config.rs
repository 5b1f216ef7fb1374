//! Configuration loading from tether.toml.

use runtime::SessionOptions;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Reasoning gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Tool host session configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Reasoning gateway configuration.
#[derive(Debug, Deserialize)]
pub struct GatewayConfig {
    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    /// Anthropic API key (sk-ant-api01-...). Falls back to `ANTHROPIC_API_KEY`.
    pub api_key: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// System prompt; a built-in prompt is used when unset.
    pub system: Option<String>,

    /// Messages endpoint override.
    pub base_url: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            system: None,
            base_url: None,
        }
    }
}

/// Tool host session configuration.
#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_secs: default_handshake_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SessionConfig {
    pub fn options(&self) -> SessionOptions {
        SessionOptions {
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_handshake_timeout_secs() -> u64 {
    SessionOptions::default().handshake_timeout.as_secs()
}

fn default_request_timeout_secs() -> u64 {
    SessionOptions::default().request_timeout.as_secs()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load the file if it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.handshake_timeout_secs == 0 || self.session.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("session timeouts must be at least 1 second".into()));
        }
        if self.gateway.max_tokens == 0 {
            return Err(ConfigError::Invalid("gateway.max_tokens must be positive".into()));
        }
        Ok(())
    }

    /// Resolve the API key: config first, then the environment.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    fn api_key_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
        self.gateway
            .api_key
            .clone()
            .or_else(|| env(API_KEY_ENV))
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("API key not configured: set gateway.api_key or ANTHROPIC_API_KEY")]
    MissingApiKey,
}
