//! pgdraft: AI-assisted PostgreSQL schema inference for CSV imports.
//!
//! pgdraft samples a CSV file, infers a PostgreSQL column type for every
//! header — heuristically, or by delegating batches of columns to an LLM
//! provider with heuristic fallback — and generates a pgloader
//! configuration plus a shell script to run the import.
//!
//! # Core Principles
//!
//! - **Always complete**: heuristic fallback means every run can produce
//!   a full schema, with or without an LLM
//! - **Bounded requests**: wide CSVs are chunked so no inference request
//!   carries more than a configured number of columns
//! - **Deterministic floor**: the heuristic classifier is a total
//!   function with no failure path
//!
//! # Example
//!
//! ```no_run
//! use pgdraft::{InferenceEngine, SampleReader};
//!
//! let sample = SampleReader::new().sample_file("data.csv").unwrap();
//! let schema = InferenceEngine::new().infer_heuristic(&sample).unwrap();
//!
//! println!("table: {}", schema.table_name);
//! println!("columns: {}", schema.columns.len());
//! ```

pub mod config;
pub mod error;
pub mod generate;
pub mod inference;
pub mod input;
pub mod llm;
pub mod sanitize;
pub mod schema;
pub mod state;

pub use config::{DraftConfig, PerformanceConfig};
pub use error::{PgDraftError, Result};
pub use generate::{GenerationResult, generate_all};
pub use inference::{
    ColumnChunk, HeuristicClassifier, InferenceConfig, InferenceEngine, chunk_columns,
    chunk_columns_smart,
};
pub use input::{ColumnSample, CsvProperties, CsvSample, SampleConfig, SampleReader};
pub use llm::{
    AnthropicProvider, MockProvider, OllamaProvider, ProviderConfig, TypeInferenceProvider,
};
pub use sanitize::{sanitize_identifier, sanitize_table_name};
pub use schema::{ColumnSchema, ConfidenceLevel, InferredType, TableSchema};
pub use state::{ImportPhase, ImportState, ImportStatus, StateManager, compute_file_checksum};
