//! Strict parse-or-fail boundary for provider responses.
//!
//! Providers return loosely structured text; everything downstream of
//! this module only ever sees validated [`InferredType`] values or an
//! error. Raw payloads never cross into the orchestrator.

use serde::Deserialize;
use tracing::warn;

use crate::error::{PgDraftError, Result};
use crate::inference::ColumnChunk;
use crate::sanitize::sanitize_identifier;
use crate::schema::{ConfidenceLevel, InferredType, is_valid_pg_type};

/// Raw per-column entry as providers tend to emit it.
///
/// Field aliases absorb the common naming variations.
#[derive(Debug, Deserialize)]
struct RawInferredType {
    #[serde(alias = "name")]
    column_name: Option<String>,
    #[serde(alias = "pg_type")]
    postgresql_type: Option<String>,
    #[serde(default)]
    confidence: Option<ConfidenceLevel>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    nullable: Option<bool>,
    #[serde(default)]
    constraints: Vec<String>,
    #[serde(default)]
    cast_rule: Option<String>,
}

/// Parse a provider's text response into validated inferred types.
///
/// Strips markdown code fences, parses a JSON array, and validates
/// each entry. Entries missing required fields or carrying an unknown
/// PostgreSQL type are skipped with a warning; an unparseable payload
/// fails the whole chunk.
pub fn parse_type_response(text: &str, chunk: &ColumnChunk) -> Result<Vec<InferredType>> {
    let json_str = extract_json(text);

    let raw: Vec<RawInferredType> = serde_json::from_str(json_str).map_err(|e| {
        PgDraftError::Provider(format!("failed to parse JSON response: {e}"))
    })?;

    let mut inferred = Vec::with_capacity(raw.len());
    for item in raw {
        match validate_entry(item) {
            Ok(t) => inferred.push(t),
            Err(e) => warn!(error = %e, "skipping invalid type entry in response"),
        }
    }

    if inferred.is_empty() {
        return Err(PgDraftError::Provider(
            "response contained no valid type entries".to_string(),
        ));
    }

    if inferred.len() != chunk.columns.len() {
        warn!(
            expected = chunk.columns.len(),
            got = inferred.len(),
            chunk_id = chunk.chunk_id,
            "response column count does not match chunk"
        );
    }

    Ok(inferred)
}

/// Extract the JSON body from a response, handling markdown fences.
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(rest) = trimmed.split_once("```json").map(|(_, rest)| rest) {
        rest.split("```").next().unwrap_or(trimmed).trim()
    } else if let Some(rest) = trimmed.split_once("```").map(|(_, rest)| rest) {
        rest.split("```").next().unwrap_or(trimmed).trim()
    } else {
        trimmed
    }
}

fn validate_entry(item: RawInferredType) -> Result<InferredType> {
    let column_name = item
        .column_name
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PgDraftError::Provider("missing column_name".to_string()))?;

    let pg_type = item
        .postgresql_type
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PgDraftError::Provider("missing postgresql_type".to_string()))?
        .to_lowercase();

    if !is_valid_pg_type(&pg_type) {
        return Err(PgDraftError::Provider(format!(
            "unknown PostgreSQL type '{pg_type}' for column '{column_name}'"
        )));
    }

    Ok(InferredType {
        column_name: sanitize_identifier(&column_name),
        pg_type,
        confidence: item.confidence.unwrap_or_default(),
        reasoning: item.reasoning.unwrap_or_default(),
        nullable: item.nullable.unwrap_or(true),
        constraints: item.constraints,
        cast_rule: item.cast_rule,
    })
}
