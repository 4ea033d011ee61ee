//! Completion provider abstraction.
//!
//! The language model behind the answerer is an opaque function from a
//! bounded prompt to text. [`OpenAiCompletion`] implements it over the chat
//! completions API with the same retry strategy as the embedding provider.

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::config::CompletionConfig;
use crate::error::{QaError, Result};

/// One bounded completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Fixed system instruction framing the task.
    pub system: String,
    /// User-visible prompt (context + question).
    pub prompt: String,
    /// Generation budget in tokens.
    pub max_tokens: usize,
    pub temperature: f32,
    pub stop_sequence: Option<String>,
}

/// Trait for completion backends.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for `request`. Failures surface as
    /// [`QaError::Provider`], never as an empty answer.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;
}

/// Completion provider backed by `POST /v1/chat/completions`.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiCompletion {
    model: String,
    api_key: String,
    client: reqwest::Client,
    max_retries: u32,
}

impl OpenAiCompletion {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| QaError::Provider("OPENAI_API_KEY environment variable not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QaError::Provider(format!("build HTTP client: {}", e)))?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            client,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "n": 1,
        });
        if let Some(stop) = &request.stop_sequence {
            body["stop"] = serde_json::json!(stop);
        }

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post("https://api.openai.com/v1/chat/completions")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| QaError::Provider(format!("read response: {}", e)))?;
                        return parse_completion_response(&json);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        warn!(attempt, %status, "completion request failed, retrying");
                        last_err = Some(QaError::Provider(format!(
                            "completions API error {}: {}",
                            status, body_text
                        )));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    return Err(QaError::Provider(format!(
                        "completions API error {}: {}",
                        status, body_text
                    )));
                }
                Err(e) => {
                    warn!(attempt, error = %e, "completion request failed, retrying");
                    last_err = Some(QaError::Provider(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| QaError::Provider("completion failed after retries".to_string())))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Extract `choices[0].message.content`, trimmed.
fn parse_completion_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|t| t.trim().to_string())
        .ok_or_else(|| QaError::Provider("invalid response: missing choices".into()))
}

/// Create the [`CompletionProvider`] selected by configuration.
pub fn create_provider(config: &CompletionConfig) -> Result<Box<dyn CompletionProvider>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiCompletion::new(config)?)),
        other => Err(QaError::Provider(format!(
            "unknown completion provider: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_response() {
        let json = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "  An answer.\n" } }
            ]
        });
        assert_eq!(parse_completion_response(&json).unwrap(), "An answer.");
    }

    #[test]
    fn test_parse_rejects_empty_choices() {
        let json = serde_json::json!({ "choices": [] });
        assert!(parse_completion_response(&json).is_err());
    }
}
