//! Ollama local model provider implementation.
//!
//! Talks to a locally running Ollama server; no API key needed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{PgDraftError, Result};
use crate::inference::ColumnChunk;
use crate::schema::InferredType;

use super::prompts;
use super::provider::{ProviderConfig, TypeInferenceProvider};
use super::response::parse_type_response;

/// Default Ollama endpoint.
const DEFAULT_URL: &str = "http://localhost:11434/api/generate";

/// Ollama local model provider.
pub struct OllamaProvider {
    client: Client,
    url: String,
    config: ProviderConfig,
}

impl OllamaProvider {
    /// Create a provider against the default local endpoint.
    pub fn new() -> Result<Self> {
        Self::with_config(ProviderConfig {
            model: "llama3.2".to_string(),
            ..Default::default()
        })
    }

    /// Create a provider with custom configuration.
    pub fn with_config(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            // Local models are slow; allow generous time per request.
            .timeout(Duration::from_secs(config.timeout_secs.max(120)))
            .build()
            .map_err(|e| PgDraftError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: DEFAULT_URL.to_string(),
            config,
        })
    }

    /// Override the endpoint URL (e.g. a remote Ollama host).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl TypeInferenceProvider for OllamaProvider {
    async fn infer_types(&self, chunk: &ColumnChunk) -> Result<Vec<InferredType>> {
        debug!(
            chunk = chunk.chunk_id + 1,
            total = chunk.total_chunks,
            model = %self.config.model,
            "calling Ollama"
        );

        let body = json!({
            "model": self.config.model,
            "prompt": format!(
                "{}\n\n{}",
                prompts::system_prompt(),
                prompts::type_inference_prompt(chunk)
            ),
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
            }
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                PgDraftError::Provider(format!(
                    "Ollama request failed (is Ollama running?): {e}"
                ))
            })?;

        if !response.status().is_success() {
            return Err(PgDraftError::Provider(format!(
                "Ollama error ({})",
                response.status()
            )));
        }

        let api_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| PgDraftError::Provider(format!("Failed to parse Ollama response: {e}")))?;

        parse_type_response(&api_response.response, chunk)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_deserialization() {
        let json = r#"{"model": "llama3.2", "response": "[]", "done": true}"#;
        let parsed: OllamaResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.response, "[]");
    }
}
