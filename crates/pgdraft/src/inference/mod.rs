//! Schema inference: chunking, heuristic classification, orchestration.

mod chunker;
mod engine;
mod heuristic;

pub use chunker::{ColumnChunk, MAX_PREVIEW_ROWS, chunk_columns, chunk_columns_smart};
pub use engine::{InferenceConfig, InferenceEngine, InferencePhase};
pub use heuristic::HeuristicClassifier;
