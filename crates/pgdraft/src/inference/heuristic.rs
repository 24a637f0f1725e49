//! Pattern-based heuristic type classifier.
//!
//! The classifier is the deterministic floor under every inference run:
//! it is a total function, never fails, and degrades to `text`/`varchar`
//! rather than raising. Patterns are tested in a fixed priority order
//! and a pattern applies only when every sampled value matches it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::input::ColumnSample;
use crate::sanitize::sanitize_identifier;
use crate::schema::{ConfidenceLevel, InferredType};

/// Values examined per column; bounds pattern-test cost on wide samples.
const MAX_PATTERN_VALUES: usize = 100;

/// Longest value (exclusive) still mapped to varchar; beyond it, text.
const VARCHAR_LIMIT: usize = 255;

/// Slack added to the observed maximum length for varchar columns.
const VARCHAR_BUFFER: usize = 50;

/// Signed 32-bit bounds; integers outside promote to bigint.
const INT4_MIN: i128 = -2_147_483_648;
const INT4_MAX: i128 = 2_147_483_647;

static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static TIMESTAMP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}").unwrap());

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Boolean-like tokens, matched case-insensitively.
const BOOLEAN_TOKENS: &[&str] = &["true", "false", "t", "f", "yes", "no", "y", "n", "1", "0"];

/// Name fragments that mark a numeric column as currency/decimal data.
const CURRENCY_HINTS: &[&str] = &[
    "usd", "price", "value", "amount", "total", "funding", "valuation",
];

/// Deterministic pattern-based type classifier.
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a column sample into an [`InferredType`].
    ///
    /// Total function: every input yields a usable type. The column
    /// name is sanitized first and all keyword heuristics run against
    /// the sanitized form.
    pub fn classify(&self, column: &ColumnSample) -> InferredType {
        let name = sanitize_identifier(&column.name);
        let nullable = column.null_percentage() > 0.0;

        let values: Vec<&str> = column
            .values
            .iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .take(MAX_PATTERN_VALUES)
            .collect();

        if values.is_empty() {
            return InferredType {
                column_name: name,
                pg_type: "text".to_string(),
                confidence: ConfidenceLevel::Low,
                reasoning: "All values are null, defaulting to text".to_string(),
                nullable: true,
                constraints: vec![],
                cast_rule: None,
            };
        }

        if values.iter().all(|v| UUID_PATTERN.is_match(v)) {
            return self.verdict(name, "uuid", ConfidenceLevel::High,
                "All values match UUID pattern", nullable);
        }

        if values
            .iter()
            .all(|v| BOOLEAN_TOKENS.contains(&v.to_lowercase().as_str()))
        {
            return self.verdict(name, "boolean", ConfidenceLevel::High,
                "All values are boolean-like", nullable);
        }

        if let Some(verdict) = self.classify_integer(&name, &values, nullable) {
            return verdict;
        }

        if let Some(verdict) = self.classify_numeric(&name, &values, nullable) {
            return verdict;
        }

        if values.iter().all(|v| DATE_PATTERN.is_match(v)) {
            return self.verdict(name, "date", ConfidenceLevel::High,
                "All values match date pattern (YYYY-MM-DD)", nullable);
        }

        if values.iter().all(|v| TIMESTAMP_PATTERN.is_match(v)) {
            return self.verdict(name, "timestamptz", ConfidenceLevel::High,
                "All values match timestamp pattern", nullable);
        }

        if values.iter().all(|v| EMAIL_PATTERN.is_match(v)) {
            return self.verdict(name, "text", ConfidenceLevel::Medium,
                "All values match email pattern", nullable);
        }

        // Default: bounded varchar for short strings, text otherwise.
        let max_length = values.iter().map(|v| v.len()).max().unwrap_or(0);
        let pg_type = if max_length < VARCHAR_LIMIT {
            format!("varchar({})", max_length + VARCHAR_BUFFER)
        } else {
            "text".to_string()
        };

        InferredType {
            column_name: name,
            pg_type,
            confidence: ConfidenceLevel::Medium,
            reasoning: format!("String values with max length {max_length}"),
            nullable,
            constraints: vec![],
            cast_rule: None,
        }
    }

    /// Integer test: all values parse as integers; i32 range decides
    /// integer vs bigint.
    fn classify_integer(
        &self,
        name: &str,
        values: &[&str],
        nullable: bool,
    ) -> Option<InferredType> {
        let parsed: Option<Vec<i128>> = values.iter().map(|v| v.parse::<i128>().ok()).collect();
        let parsed = parsed?;

        let min = *parsed.iter().min()?;
        let max = *parsed.iter().max()?;

        let pg_type = if min >= INT4_MIN && max <= INT4_MAX {
            "integer"
        } else {
            "bigint"
        };

        Some(InferredType {
            column_name: name.to_string(),
            pg_type: pg_type.to_string(),
            confidence: ConfidenceLevel::High,
            reasoning: format!("All values are integers (range: {min} to {max})"),
            nullable,
            constraints: vec![],
            cast_rule: None,
        })
    }

    /// Numeric test: all values parse as floats (having already failed
    /// the integer test). Currency-like names or fractional values
    /// escalate confidence.
    fn classify_numeric(
        &self,
        name: &str,
        values: &[&str],
        nullable: bool,
    ) -> Option<InferredType> {
        let parsed: Option<Vec<f64>> = values.iter().map(|v| v.parse::<f64>().ok()).collect();
        let parsed = parsed?;

        let currency_name = CURRENCY_HINTS.iter().any(|hint| name.contains(hint));
        let fractional = parsed.iter().any(|f| f.fract().abs() > f64::EPSILON);

        let (confidence, reasoning) = if currency_name || fractional {
            (
                ConfidenceLevel::High,
                "Numeric values carrying currency or decimal precision".to_string(),
            )
        } else {
            (
                ConfidenceLevel::Medium,
                "All values are numeric with decimal points".to_string(),
            )
        };

        Some(InferredType {
            column_name: name.to_string(),
            pg_type: "numeric".to_string(),
            confidence,
            reasoning,
            nullable,
            constraints: vec![],
            cast_rule: None,
        })
    }

    fn verdict(
        &self,
        name: String,
        pg_type: &str,
        confidence: ConfidenceLevel,
        reasoning: &str,
        nullable: bool,
    ) -> InferredType {
        InferredType {
            column_name: name,
            pg_type: pg_type.to_string(),
            confidence,
            reasoning: reasoning.to_string(),
            nullable,
            constraints: vec![],
            cast_rule: None,
        }
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}
