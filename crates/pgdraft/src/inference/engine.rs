//! Inference orchestration: chunk dispatch, merge, and fallback.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{PgDraftError, Result};
use crate::input::{ColumnSample, CsvSample};
use crate::llm::TypeInferenceProvider;
use crate::sanitize::{dedupe_names, sanitize_table_name};
use crate::schema::{ColumnSchema, InferredType, TableSchema};

use super::chunker::{ColumnChunk, chunk_columns, chunk_columns_smart};
use super::heuristic::HeuristicClassifier;

/// Phases of a single inference run.
///
/// Exists only for the duration of one call; never persisted. `Failed`
/// is reachable only when fallback is disabled and the capability is
/// unusable for the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferencePhase {
    Chunking,
    Dispatching,
    Merging,
    Finalizing,
    Done,
    Failed,
}

/// Configuration for an inference run.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Maximum columns per chunk.
    pub chunk_size: usize,
    /// Group related columns together when chunking.
    pub smart_chunking: bool,
    /// Reclassify failed chunks heuristically instead of dropping them.
    pub use_fallback: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            chunk_size: 20,
            smart_chunking: true,
            use_fallback: true,
        }
    }
}

/// Drives schema inference for one sampled CSV.
///
/// Holds no mutable state; each [`infer`](Self::infer) call is
/// independent and re-entrant.
pub struct InferenceEngine {
    config: InferenceConfig,
    classifier: HeuristicClassifier,
    provider: Option<Arc<dyn TypeInferenceProvider>>,
}

impl InferenceEngine {
    /// Create an engine with default configuration and no provider.
    pub fn new() -> Self {
        Self::with_config(InferenceConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: InferenceConfig) -> Self {
        Self {
            config,
            classifier: HeuristicClassifier::new(),
            provider: None,
        }
    }

    /// Attach an LLM provider. Without one, every run is heuristic-only.
    pub fn with_provider(mut self, provider: Arc<dyn TypeInferenceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Infer the table schema for a sampled CSV.
    ///
    /// Chunks the columns, dispatches all chunks to the provider
    /// concurrently (when one is configured), patches per-chunk
    /// failures with the heuristic classifier, and assembles the final
    /// schema with primary-key selection.
    pub async fn infer(&self, sample: &CsvSample) -> Result<TableSchema> {
        info!(
            columns = sample.headers.len(),
            "starting type inference"
        );

        self.transition(InferencePhase::Chunking);
        let chunks = self.chunk(sample)?;
        info!(chunks = chunks.len(), "processing column chunks");

        let column_samples: HashMap<String, ColumnSample> = sample
            .column_samples()
            .into_iter()
            .map(|cs| (cs.name.clone(), cs))
            .collect();

        let Some(provider) = self.provider.clone() else {
            // No capability configured: classify every chunk directly.
            debug!("no provider configured, running heuristic-only inference");
            let inferred = chunks
                .iter()
                .flat_map(|chunk| self.classify_chunk(chunk, &column_samples))
                .collect();
            return self.finalize(sample, inferred);
        };

        self.transition(InferencePhase::Dispatching);
        let results = dispatch_chunks(provider, &chunks).await;

        // Systemic failure: nothing came back usable for any chunk.
        let failed_count = results.iter().filter(|r| r.is_err()).count();
        if failed_count == chunks.len() {
            if self.config.use_fallback {
                warn!("capability failed for every chunk, degrading to heuristic inference");
                let inferred = chunks
                    .iter()
                    .flat_map(|chunk| self.classify_chunk(chunk, &column_samples))
                    .collect();
                return self.finalize(sample, inferred);
            }
            self.transition(InferencePhase::Failed);
            return Err(PgDraftError::Inference(format!(
                "all {} chunk requests failed and fallback is disabled",
                chunks.len()
            )));
        }

        self.transition(InferencePhase::Merging);
        let mut inferred: Vec<InferredType> = Vec::with_capacity(sample.headers.len());
        for (chunk, result) in chunks.iter().zip(results) {
            match result {
                Ok(types) => {
                    debug!(chunk = chunk.chunk_id, columns = types.len(), "chunk succeeded");
                    inferred.extend(types);
                }
                Err(e) if self.config.use_fallback => {
                    info!(
                        chunk = chunk.chunk_id,
                        error = %e,
                        "chunk failed, using heuristic fallback"
                    );
                    inferred.extend(self.classify_chunk(chunk, &column_samples));
                }
                Err(e) => {
                    // Accepted behavior: without fallback the schema is
                    // simply short these columns.
                    warn!(
                        chunk = chunk.chunk_id,
                        columns = ?chunk.columns,
                        error = %e,
                        "chunk failed, dropping its columns (fallback disabled)"
                    );
                }
            }
        }

        self.finalize(sample, inferred)
    }

    /// Infer a schema using heuristics only, no provider involved.
    pub fn infer_heuristic(&self, sample: &CsvSample) -> Result<TableSchema> {
        if sample.headers.is_empty() {
            return Err(PgDraftError::EmptyData("no columns to infer".to_string()));
        }

        info!("using heuristic-only inference");
        let inferred = sample
            .column_samples()
            .iter()
            .map(|col| self.classifier.classify(col))
            .collect();

        self.finalize(sample, inferred)
    }

    fn chunk(&self, sample: &CsvSample) -> Result<Vec<ColumnChunk>> {
        if self.config.smart_chunking {
            chunk_columns_smart(sample, self.config.chunk_size)
        } else {
            chunk_columns(sample, self.config.chunk_size)
        }
    }

    /// Heuristically classify every column of one chunk, in chunk order.
    fn classify_chunk(
        &self,
        chunk: &ColumnChunk,
        samples: &HashMap<String, ColumnSample>,
    ) -> Vec<InferredType> {
        chunk
            .columns
            .iter()
            .filter_map(|name| samples.get(name))
            .map(|cs| self.classifier.classify(cs))
            .collect()
    }

    /// Assemble the final schema: collision-free names, primary key,
    /// table name.
    fn finalize(&self, sample: &CsvSample, inferred: Vec<InferredType>) -> Result<TableSchema> {
        self.transition(InferencePhase::Finalizing);

        // Sanitization is not injective; dedupe repeats in order.
        let names: Vec<String> = inferred.iter().map(|t| t.column_name.clone()).collect();
        let unique_names = dedupe_names(&names);

        let columns: Vec<ColumnSchema> = inferred
            .into_iter()
            .zip(unique_names)
            .map(|(t, name)| ColumnSchema {
                name,
                pg_type: t.pg_type,
                nullable: t.nullable,
                constraints: t.constraints,
                cast_rule: t.cast_rule,
            })
            .collect();

        let primary_key = select_primary_key(&columns);

        let stem = sample
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "table".to_string());

        let schema = TableSchema {
            table_name: sanitize_table_name(&stem),
            columns,
            primary_key,
        };
        schema.validate()?;

        self.transition(InferencePhase::Done);
        info!(
            columns = schema.columns.len(),
            primary_key = ?schema.primary_key,
            "schema inference complete"
        );

        Ok(schema)
    }

    fn transition(&self, phase: InferencePhase) {
        debug!(?phase, "inference phase");
    }
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatch every chunk concurrently and join all results.
///
/// One outstanding request per chunk, all in flight simultaneously, no
/// ordering dependency between chunks; the merge step does not start
/// until every request has resolved. A task that dies without
/// reporting (panic) counts as a failed chunk.
async fn dispatch_chunks(
    provider: Arc<dyn TypeInferenceProvider>,
    chunks: &[ColumnChunk],
) -> Vec<Result<Vec<InferredType>>> {
    debug!(provider = provider.name(), chunks = chunks.len(), "dispatching chunks");

    let mut set = JoinSet::new();
    for chunk in chunks {
        let provider = provider.clone();
        let chunk = chunk.clone();
        set.spawn(async move {
            let result = provider.infer_types(&chunk).await;
            (chunk.chunk_id, result)
        });
    }

    let mut results: Vec<Result<Vec<InferredType>>> = (0..chunks.len())
        .map(|_| {
            Err(PgDraftError::Provider(
                "chunk request did not resolve".to_string(),
            ))
        })
        .collect();

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((chunk_id, result)) => {
                if let Some(slot) = results.get_mut(chunk_id) {
                    *slot = result;
                }
            }
            Err(e) => warn!(error = %e, "chunk task aborted"),
        }
    }

    results
}

/// Pick the primary-key column by priority score; lower wins, first
/// qualifying column wins ties.
///
/// The winner's constraints are left untouched — primary-key
/// enforcement happens in the generated post-load step, not in the
/// per-column DDL.
fn select_primary_key(columns: &[ColumnSchema]) -> Option<String> {
    let mut best: Option<(u8, &ColumnSchema)> = None;

    for col in columns {
        let is_uuid = col.pg_type == "uuid";
        let is_integral = matches!(col.pg_type.as_str(), "integer" | "bigint");
        let name = col.name.as_str();

        let score = if is_uuid && name.contains("identifier") && name.contains("uuid") {
            Some(0)
        } else if is_uuid && name == "uuid" {
            Some(1)
        } else if is_uuid && name.contains("uuid") {
            Some(2)
        } else if name == "id" {
            Some(3)
        } else if name.ends_with("_id") && is_integral {
            Some(4)
        } else {
            None
        };

        if let Some(s) = score {
            if best.is_none_or(|(bs, _)| s < bs) {
                best = Some((s, col));
            }
        }
    }

    best.map(|(_, col)| col.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::CsvProperties;
    use crate::llm::MockProvider;
    use indexmap::IndexMap;
    use std::path::PathBuf;

    fn make_sample(columns: Vec<(&str, Vec<&str>)>) -> CsvSample {
        let headers: Vec<String> = columns.iter().map(|(n, _)| n.to_string()).collect();
        let row_count = columns.first().map(|(_, v)| v.len()).unwrap_or(0);

        let rows: Vec<IndexMap<String, Option<String>>> = (0..row_count)
            .map(|i| {
                columns
                    .iter()
                    .map(|(name, values)| {
                        let v = values.get(i).filter(|s| !s.is_empty());
                        (name.to_string(), v.map(|s| s.to_string()))
                    })
                    .collect()
            })
            .collect();

        CsvSample {
            path: PathBuf::from("startup-funding.csv"),
            properties: CsvProperties {
                delimiter: b',',
                encoding: "utf-8".to_string(),
                quote_char: b'"',
                has_header: true,
                row_count: Some(row_count),
                column_count: headers.len(),
            },
            headers,
            rows,
            sample_size: row_count,
        }
    }

    #[test]
    fn test_heuristic_inference() {
        let sample = make_sample(vec![
            ("id", vec!["1", "2", "3"]),
            ("price", vec!["9.99", "19.99", "5.00"]),
            ("name", vec!["a", "b", "c"]),
        ]);

        let engine = InferenceEngine::new();
        let schema = engine.infer_heuristic(&sample).unwrap();

        assert_eq!(schema.table_name, "startup_funding");
        assert_eq!(schema.columns.len(), 3);
        assert_eq!(schema.get_column("id").unwrap().pg_type, "integer");
        assert_eq!(schema.get_column("price").unwrap().pg_type, "numeric");
        assert_eq!(schema.primary_key, Some("id".to_string()));
    }

    #[test]
    fn test_heuristic_empty_fails() {
        let sample = make_sample(vec![]);
        let engine = InferenceEngine::new();
        assert!(engine.infer_heuristic(&sample).is_err());
    }

    #[tokio::test]
    async fn test_infer_without_provider_matches_heuristic() {
        let sample = make_sample(vec![
            ("id", vec!["1", "2"]),
            ("active", vec!["true", "false"]),
        ]);

        let engine = InferenceEngine::new();
        let via_infer = engine.infer(&sample).await.unwrap();
        let via_heuristic = engine.infer_heuristic(&sample).unwrap();

        assert_eq!(via_infer, via_heuristic);
    }

    #[tokio::test]
    async fn test_infer_with_mock_provider() {
        let sample = make_sample(vec![
            ("a", vec!["1"]),
            ("b", vec!["2"]),
        ]);

        let engine = InferenceEngine::with_config(InferenceConfig {
            chunk_size: 1,
            smart_chunking: false,
            use_fallback: true,
        })
        .with_provider(Arc::new(MockProvider::new()));

        let schema = engine.infer(&sample).await.unwrap();
        assert_eq!(schema.columns.len(), 2);
        // Mock classifies everything as text.
        assert!(schema.columns.iter().all(|c| c.pg_type == "text"));
    }

    #[tokio::test]
    async fn test_fallback_patches_failed_chunk() {
        // Chunk 0 = {count}, chunk 1 = {price}: chunk 1 fails and falls
        // back to the heuristic classifier.
        let sample = make_sample(vec![
            ("count", vec!["1", "2"]),
            ("price", vec!["9.99", "1.50"]),
        ]);

        let engine = InferenceEngine::with_config(InferenceConfig {
            chunk_size: 1,
            smart_chunking: false,
            use_fallback: true,
        })
        .with_provider(Arc::new(MockProvider::failing_chunks([1])));

        let schema = engine.infer(&sample).await.unwrap();
        assert_eq!(schema.columns.len(), 2);
        assert_eq!(schema.get_column("count").unwrap().pg_type, "text"); // from mock
        assert_eq!(schema.get_column("price").unwrap().pg_type, "numeric"); // heuristic
    }

    #[tokio::test]
    async fn test_fallback_matches_direct_classification() {
        let sample = make_sample(vec![
            ("kept", vec!["x", "y"]),
            ("lost", vec!["2024-01-01", "2024-02-02"]),
        ]);

        let engine = InferenceEngine::with_config(InferenceConfig {
            chunk_size: 1,
            smart_chunking: false,
            use_fallback: true,
        })
        .with_provider(Arc::new(MockProvider::failing_chunks([1])));

        let schema = engine.infer(&sample).await.unwrap();

        let classifier = HeuristicClassifier::new();
        let direct = classifier.classify(&sample.column_samples()[1]);
        let patched = schema.get_column("lost").unwrap();
        assert_eq!(patched.pg_type, direct.pg_type);
        assert_eq!(patched.nullable, direct.nullable);
    }

    #[tokio::test]
    async fn test_no_fallback_drops_failed_chunk() {
        let sample = make_sample(vec![
            ("a", vec!["1"]),
            ("b", vec!["2"]),
            ("c", vec!["3"]),
        ]);

        let engine = InferenceEngine::with_config(InferenceConfig {
            chunk_size: 1,
            smart_chunking: false,
            use_fallback: false,
        })
        .with_provider(Arc::new(MockProvider::failing_chunks([1])));

        let schema = engine.infer(&sample).await.unwrap();
        // Partial schema: column b silently missing.
        assert_eq!(schema.columns.len(), 2);
        assert!(schema.get_column("b").is_none());
    }

    #[tokio::test]
    async fn test_systemic_failure_without_fallback_errors() {
        let sample = make_sample(vec![("a", vec!["1"]), ("b", vec!["2"])]);

        let engine = InferenceEngine::with_config(InferenceConfig {
            chunk_size: 1,
            smart_chunking: false,
            use_fallback: false,
        })
        .with_provider(Arc::new(MockProvider::failing_all()));

        assert!(engine.infer(&sample).await.is_err());
    }

    #[tokio::test]
    async fn test_systemic_failure_with_fallback_degrades() {
        let sample = make_sample(vec![
            ("n", vec!["1", "2"]),
            ("d", vec!["2020-05-05", "2021-06-06"]),
        ]);

        let engine = InferenceEngine::with_config(InferenceConfig {
            chunk_size: 1,
            smart_chunking: false,
            use_fallback: true,
        })
        .with_provider(Arc::new(MockProvider::failing_all()));

        let schema = engine.infer(&sample).await.unwrap();
        assert_eq!(schema.columns.len(), 2);
        assert_eq!(schema.get_column("n").unwrap().pg_type, "integer");
        assert_eq!(schema.get_column("d").unwrap().pg_type, "date");
    }

    #[test]
    fn test_primary_key_priorities() {
        fn col(name: &str, pg_type: &str) -> ColumnSchema {
            ColumnSchema {
                name: name.to_string(),
                pg_type: pg_type.to_string(),
                nullable: false,
                constraints: vec![],
                cast_rule: None,
            }
        }

        // identifier+uuid beats bare uuid name.
        let cols = vec![col("uuid", "uuid"), col("identifier_uuid", "uuid")];
        assert_eq!(select_primary_key(&cols), Some("identifier_uuid".to_string()));

        // Exact "uuid" beats a contains-uuid name.
        let cols = vec![col("org_uuid", "uuid"), col("uuid", "uuid")];
        assert_eq!(select_primary_key(&cols), Some("uuid".to_string()));

        // uuid-typed candidates beat "id".
        let cols = vec![col("id", "integer"), col("org_uuid", "uuid")];
        assert_eq!(select_primary_key(&cols), Some("org_uuid".to_string()));

        // "id" with any type qualifies.
        let cols = vec![col("id", "varchar(60)"), col("user_id", "integer")];
        assert_eq!(select_primary_key(&cols), Some("id".to_string()));

        // _id suffix requires an integral type.
        let cols = vec![col("user_id", "text")];
        assert_eq!(select_primary_key(&cols), None);
        let cols = vec![col("user_id", "bigint")];
        assert_eq!(select_primary_key(&cols), Some("user_id".to_string()));

        // A "uuid" name without uuid type does not qualify.
        let cols = vec![col("uuid", "text")];
        assert_eq!(select_primary_key(&cols), None);
    }

    #[test]
    fn test_primary_key_constraints_untouched() {
        let sample = make_sample(vec![("id", vec!["1"])]);
        let engine = InferenceEngine::new();
        let schema = engine.infer_heuristic(&sample).unwrap();

        assert_eq!(schema.primary_key, Some("id".to_string()));
        assert!(schema.get_column("id").unwrap().constraints.is_empty());
    }

    #[test]
    fn test_colliding_headers_deduped() {
        let sample = make_sample(vec![("A.B", vec!["1"]), ("A-B", vec!["2"])]);
        let engine = InferenceEngine::new();
        let schema = engine.infer_heuristic(&sample).unwrap();

        let names = schema.column_names();
        assert_eq!(names, vec!["a_b", "a_b_2"]);
        assert!(schema.validate().is_ok());
    }
}
