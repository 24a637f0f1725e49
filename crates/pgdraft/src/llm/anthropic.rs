//! Anthropic Claude API provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{PgDraftError, Result};
use crate::inference::ColumnChunk;
use crate::schema::InferredType;

use super::prompts;
use super::provider::{ProviderConfig, TypeInferenceProvider};
use super::response::parse_type_response;

/// Anthropic API endpoint.
const API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version.
const API_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    config: ProviderConfig,
}

impl AnthropicProvider {
    /// Create a new provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, ProviderConfig::default())
    }

    /// Create a new provider with custom configuration.
    pub fn with_config(api_key: impl Into<String>, config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PgDraftError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    /// Create from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            PgDraftError::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| PgDraftError::Config(format!("Invalid API key: {e}")))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    /// Send one inference request; no retries at this level.
    async fn send_request(&self, chunk: &ColumnChunk) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": prompts::system_prompt(),
            "messages": [
                {
                    "role": "user",
                    "content": prompts::type_inference_prompt(chunk)
                }
            ]
        });

        let response = self
            .client
            .post(API_URL)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| PgDraftError::Provider(format!("API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PgDraftError::Provider(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| PgDraftError::Provider(format!("Failed to parse API response: {e}")))?;

        api_response
            .content
            .into_iter()
            .find_map(|block| {
                if block.content_type == "text" {
                    Some(block.text)
                } else {
                    None
                }
            })
            .ok_or_else(|| PgDraftError::Provider("No text in API response".to_string()))
    }
}

#[async_trait]
impl TypeInferenceProvider for AnthropicProvider {
    async fn infer_types(&self, chunk: &ColumnChunk) -> Result<Vec<InferredType>> {
        let mut last_error = None;

        for attempt in 0..self.config.retry_attempts.max(1) {
            debug!(
                chunk = chunk.chunk_id + 1,
                total = chunk.total_chunks,
                attempt = attempt + 1,
                "calling Anthropic API"
            );

            match self.send_request(chunk).await {
                Ok(text) => match parse_type_response(&text, chunk) {
                    Ok(types) => return Ok(types),
                    Err(e) => last_error = Some(e),
                },
                Err(e) => last_error = Some(e),
            }

            if attempt + 1 < self.config.retry_attempts.max(1) {
                // Exponential backoff.
                let delay = self.config.retry_delay_secs * 2u64.pow(attempt);
                warn!(
                    chunk = chunk.chunk_id,
                    attempt = attempt + 1,
                    retry_in_secs = delay,
                    "inference request failed, retrying"
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
            }
        }

        Err(PgDraftError::Provider(format!(
            "failed to infer types after {} attempts: {}",
            self.config.retry_attempts.max(1),
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string())
        )))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

/// Anthropic API response structure.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

/// Content block in API response.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_missing_key() {
        // SAFETY: test-only env mutation, no concurrent readers of this var.
        unsafe { std::env::remove_var("ANTHROPIC_API_KEY") };
        assert!(AnthropicProvider::from_env().is_err());
    }

    #[test]
    fn test_api_response_deserialization() {
        let json = r#"{"content": [{"type": "text", "text": "[]"}]}"#;
        let parsed: ApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.content.len(), 1);
        assert_eq!(parsed.content[0].content_type, "text");
    }
}
