//! Session configuration with environment-backed defaults.
//!
//! [`ChatConfig`] is read once at startup and passed by reference into the
//! client and the chat loop. Environment lookup goes through a closure
//! ([`ChatConfig::from_lookup`]) so tests can inject values without touching
//! the process environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::api::retry::RetryConfig;
use crate::error::ChatError;
use crate::{
    API_KEY_ENV, BASE_URL_ENV, DEFAULT_MODEL, DEFAULT_TEMPERATURE, MODEL_ENV, OPENAI_BASE_URL,
};

/// Configuration for one chat session.
#[derive(Clone)]
pub struct ChatConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Model identifier. Default: `"gpt-4o"`, or `CHAT_MODEL` when set.
    pub model: String,
    /// Sampling temperature. Default: `0.3`.
    pub temperature: f32,
    /// API base URL. Default: `"https://api.openai.com/v1"`, or `OPENAI_BASE_URL`.
    pub base_url: String,
    /// Directory the context files are resolved against. Default: `"."`.
    pub root: PathBuf,
    /// Retry policy for transient failures. Default: no retries.
    pub retry: RetryConfig,
    /// Per-request timeout. Default: none.
    pub timeout: Option<Duration>,
}

// The API key never shows up in logs.
impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .field("root", &self.root)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ChatConfig {
    /// Config with the given key and every other field at its default.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: OPENAI_BASE_URL.to_string(),
            root: PathBuf::from("."),
            retry: RetryConfig::default(),
            timeout: None,
        }
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// Fails with [`ChatError::MissingApiKey`] when the key is unset or blank.
    /// Blank optional variables fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ChatError> {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = present(API_KEY_ENV).ok_or_else(|| ChatError::MissingApiKey {
            var: API_KEY_ENV.to_string(),
        })?;

        let mut config = Self::new(api_key);
        if let Some(model) = present(MODEL_ENV) {
            config.model = model;
        }
        if let Some(base_url) = present(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the directory context files are resolved against.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Retry transient failures up to `retries` times.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retry = RetryConfig::with_retries(retries);
        self
    }

    /// Set a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reject values the endpoint would refuse anyway.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.model.trim().is_empty() {
            return Err(ChatError::InvalidConfig("model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ChatError::InvalidConfig(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ChatError::InvalidConfig(format!(
                "base URL '{}' must start with http:// or https://",
                self.base_url
            )));
        }
        Ok(())
    }
}
