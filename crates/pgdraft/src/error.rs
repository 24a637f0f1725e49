//! Error types for the pgdraft library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pgdraft operations.
#[derive(Debug, Error)]
pub enum PgDraftError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file, empty column list, or no data to work with.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// LLM provider request or response failure.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Schema inference could not produce a result.
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Inferred schema violates a structural invariant.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Import state file is missing or corrupt.
    #[error("State error: {0}")]
    State(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for pgdraft operations.
pub type Result<T> = std::result::Result<T, PgDraftError>;
