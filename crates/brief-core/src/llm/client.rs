//! OpenAI-compatible `/chat/completions` adapter.

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use super::{strip_code_fence, BriefPrompt, BriefSynthesizer, LlmConfig, LlmError};

/// Single-shot completion client. No retries: a failed call is reported as
/// one [`LlmError`] and the caller decides what to do.
pub struct ChatCompletionsClient {
    client: Client,
    config: LlmConfig,
    api_key: String,
}

impl ChatCompletionsClient {
    /// Build a client. Fails when the config carries no API key.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or_else(|| LlmError::Connection {
            message: "no API key configured".to_string(),
        })?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::Connection {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &BriefPrompt) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "response_format": { "type": "json_object" },
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout {
                timeout_secs: self.config.timeout_secs,
            }
        } else {
            LlmError::Connection {
                message: format!("request failed: {}", err),
            }
        }
    }

    /// Map a non-2xx status to the matching error.
    pub(crate) fn map_http_error(
        status: StatusCode,
        retry_after: Option<u64>,
        body: &str,
    ) -> LlmError {
        let message = upstream_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown API error")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

        if status == StatusCode::TOO_MANY_REQUESTS {
            // Fall back to "... try again in 12s" style hints in the message.
            let hint = retry_after.or_else(|| {
                message
                    .rsplit("in ")
                    .next()
                    .and_then(|s| s.trim().trim_end_matches('.').trim_end_matches('s').parse().ok())
            });
            return LlmError::RateLimited {
                retry_after_secs: hint,
                message,
            };
        }

        LlmError::Api {
            status: status.as_u16(),
            message,
        }
    }

    /// Pull the first choice's message content out of a completion envelope.
    pub(crate) fn parse_response(json: &Value) -> Result<String, LlmError> {
        let choices = json
            .get("choices")
            .and_then(Value::as_array)
            .ok_or_else(|| LlmError::ResponseParse {
                message: "response has no choices array".to_string(),
            })?;

        let content = choices
            .first()
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .map(strip_code_fence)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(content.to_string())
    }
}

/// `error.message` (with `error.type` when present) from an API error body.
fn upstream_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = error.get("message")?.as_str()?;
    match error.get("type").and_then(Value::as_str) {
        Some(kind) => Some(format!("{} ({})", message, kind)),
        None => Some(message.to_string()),
    }
}

#[async_trait]
impl BriefSynthesizer for ChatCompletionsClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn synthesize(&self, urls: &[String]) -> Result<String, LlmError> {
        let prompt = BriefPrompt::new(urls, Utc::now());
        let url = self.endpoint();

        debug!("Sending completion request to {} (model {})", url, self.config.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&prompt))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            warn!("Completion API returned HTTP {}", status.as_u16());
            return Err(Self::map_http_error(status, retry_after, &body));
        }

        let json: Value = serde_json::from_str(&body).map_err(|e| LlmError::ResponseParse {
            message: format!("invalid JSON envelope: {}", e),
        })?;

        Self::parse_response(&json)
    }
}
