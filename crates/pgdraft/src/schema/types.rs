//! Core type definitions for inferred schemas.

use serde::{Deserialize, Serialize};

/// Qualitative trust label attached to an inferred type.
///
/// This is a label, not a probability: `High` means every sampled value
/// matched a strict pattern, `Low` means the classifier fell back to a
/// default with nothing to go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl Default for ConfidenceLevel {
    fn default() -> Self {
        ConfidenceLevel::Medium
    }
}

/// The classifier's (or provider's) verdict for one column.
///
/// Produced by the heuristic classifier or by an LLM provider; never
/// mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredType {
    /// Sanitized column name.
    pub column_name: String,
    /// PostgreSQL type, possibly with a length modifier (`varchar(120)`).
    pub pg_type: String,
    /// Confidence in the choice.
    pub confidence: ConfidenceLevel,
    /// Free-text explanation of why the type was chosen.
    pub reasoning: String,
    /// Whether the column admits NULL.
    pub nullable: bool,
    /// Column constraints (e.g. `UNIQUE`).
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Transform to apply to source values before loading, if any.
    #[serde(default)]
    pub cast_rule: Option<String>,
}

/// Common PostgreSQL type names accepted in provider responses.
const VALID_PG_TYPES: &[&str] = &[
    // Numeric
    "smallint", "integer", "int", "bigint", "decimal", "numeric", "real",
    "double precision", "smallserial", "serial", "bigserial",
    // Monetary
    "money",
    // Character
    "varchar", "char", "text",
    // Binary
    "bytea",
    // Date/time
    "timestamp", "timestamptz", "timestamp with time zone",
    "timestamp without time zone", "date", "time", "timetz", "interval",
    // Boolean
    "boolean", "bool",
    // Network
    "cidr", "inet", "macaddr",
    // Other
    "uuid", "json", "jsonb", "xml",
];

/// Check whether a type name is a known PostgreSQL type.
///
/// Length modifiers are ignored: `varchar(255)` and `numeric(10,2)`
/// both validate against their base type.
pub fn is_valid_pg_type(pg_type: &str) -> bool {
    let base = pg_type
        .split('(')
        .next()
        .unwrap_or(pg_type)
        .trim()
        .to_lowercase();
    VALID_PG_TYPES.contains(&base.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_pg_types() {
        assert!(is_valid_pg_type("integer"));
        assert!(is_valid_pg_type("varchar(255)"));
        assert!(is_valid_pg_type("numeric(10,2)"));
        assert!(is_valid_pg_type("TIMESTAMPTZ"));
        assert!(is_valid_pg_type("uuid"));
    }

    #[test]
    fn test_invalid_pg_types() {
        assert!(!is_valid_pg_type("string"));
        assert!(!is_valid_pg_type("number"));
        assert!(!is_valid_pg_type(""));
    }

    #[test]
    fn test_confidence_serialization() {
        let json = serde_json::to_string(&ConfidenceLevel::High).unwrap();
        assert_eq!(json, "\"high\"");
        let back: ConfidenceLevel = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(back, ConfidenceLevel::Medium);
    }
}
