//! Type-inference provider trait and configuration.

use async_trait::async_trait;

use crate::error::Result;
use crate::inference::ColumnChunk;
use crate::schema::InferredType;

/// Configuration for LLM providers.
///
/// Set at construction and never mutated; the core never reaches into
/// provider state.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Model to use (e.g. "claude-sonnet-4-20250514").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Number of retry attempts per chunk.
    pub retry_attempts: u32,
    /// Base delay between retries in seconds (doubles per attempt).
    pub retry_delay_secs: u64,
    /// Maximum tokens in a response.
    pub max_tokens: usize,
    /// Temperature for generation.
    pub temperature: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_delay_secs: 5,
            max_tokens: 4096,
            temperature: 0.2,
        }
    }
}

/// Trait for LLM-backed type inference.
///
/// Implementations must be thread-safe (Send + Sync) and safe to invoke
/// concurrently for distinct chunks; the orchestrator keeps one request
/// per chunk in flight simultaneously. Retry discipline (bounded
/// attempts, exponential backoff) belongs to the implementation — the
/// caller only ever sees the final success or failure per chunk.
#[async_trait]
pub trait TypeInferenceProvider: Send + Sync {
    /// Infer PostgreSQL types for the columns in a chunk.
    ///
    /// Returns one [`InferredType`] per column on success; must not
    /// mutate or retain the chunk. Must eventually resolve — the
    /// request timeout is enforced here, not by the caller.
    async fn infer_types(&self, chunk: &ColumnChunk) -> Result<Vec<InferredType>>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
