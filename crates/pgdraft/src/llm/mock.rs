//! Mock provider for testing.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::{PgDraftError, Result};
use crate::inference::ColumnChunk;
use crate::schema::{ConfidenceLevel, InferredType};

use super::provider::TypeInferenceProvider;

/// Mock provider that returns predictable responses.
///
/// Every column classifies as `text` with medium confidence unless the
/// chunk id is in the failure set, which makes testing the fallback and
/// partial-result paths of the orchestrator deterministic.
#[derive(Debug, Default)]
pub struct MockProvider {
    fail_chunks: HashSet<usize>,
    fail_all: bool,
}

impl MockProvider {
    /// Create a mock that succeeds for every chunk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail requests for the given chunk ids.
    pub fn failing_chunks(ids: impl IntoIterator<Item = usize>) -> Self {
        Self {
            fail_chunks: ids.into_iter().collect(),
            fail_all: false,
        }
    }

    /// Fail every request (simulates an unreachable capability).
    pub fn failing_all() -> Self {
        Self {
            fail_chunks: HashSet::new(),
            fail_all: true,
        }
    }
}

#[async_trait]
impl TypeInferenceProvider for MockProvider {
    async fn infer_types(&self, chunk: &ColumnChunk) -> Result<Vec<InferredType>> {
        if self.fail_all || self.fail_chunks.contains(&chunk.chunk_id) {
            return Err(PgDraftError::Provider(format!(
                "mock failure for chunk {}",
                chunk.chunk_id
            )));
        }

        Ok(chunk
            .columns
            .iter()
            .map(|name| InferredType {
                column_name: crate::sanitize::sanitize_identifier(name),
                pg_type: "text".to_string(),
                confidence: ConfidenceLevel::Medium,
                reasoning: "mock inference".to_string(),
                nullable: true,
                constraints: vec![],
                cast_rule: None,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
