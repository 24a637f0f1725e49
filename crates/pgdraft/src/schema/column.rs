//! Per-column schema contract.

use serde::{Deserialize, Serialize};

/// Final schema for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Sanitized column name.
    pub name: String,
    /// PostgreSQL type, possibly with a length modifier.
    pub pg_type: String,
    /// Whether the column admits NULL.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Column constraints.
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Transform to apply to source values before loading, if any.
    #[serde(default)]
    pub cast_rule: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl ColumnSchema {
    /// Whether the loader needs a custom cast for this column.
    pub fn needs_cast(&self) -> bool {
        self.cast_rule.is_some()
    }
}
