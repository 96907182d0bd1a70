mod client;
mod prompt;

pub use client::ChatCompletionsClient;
pub use prompt::BriefPrompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::error::ErrorKind;

/// Env var holding the completion API credential.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Errors surfaced by the completion API adapter.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM connection failed: {message}")]
    Connection { message: String },

    #[error("LLM request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Rate limited by LLM provider: {message}")]
    RateLimited {
        retry_after_secs: Option<u64>,
        message: String,
    },

    #[error("LLM API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM response parse error: {message}")]
    ResponseParse { message: String },

    #[error("LLM returned no completion content")]
    EmptyCompletion,
}

impl LlmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::RateLimited { .. } => ErrorKind::RateLimited,
            LlmError::EmptyCompletion => ErrorKind::MalformedModelOutput,
            LlmError::Connection { .. }
            | LlmError::Timeout { .. }
            | LlmError::Api { .. }
            | LlmError::ResponseParse { .. } => ErrorKind::TransportFailure,
        }
    }
}

/// Settings for the OpenAI-compatible completion endpoint.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Never read from or written to config files.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama3-70b-8192".to_string(),
            temperature: 0.7,
            max_tokens: 8000,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

impl LlmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Pick up the credential from [`API_KEY_ENV`] if none is set.
    pub fn with_env_api_key(self) -> Self {
        if self.api_key.is_some() {
            return self;
        }
        match std::env::var(API_KEY_ENV) {
            Ok(key) => self.with_api_key(key),
            Err(_) => self,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Something that turns a URL list into raw brief JSON text.
///
/// The returned text is untrusted; callers must parse and validate it.
#[async_trait]
pub trait BriefSynthesizer: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    async fn synthesize(&self, urls: &[String]) -> Result<String, LlmError>;
}

/// Strip a surrounding Markdown code fence (```json ... ```) if the model
/// added one despite being told not to.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}
