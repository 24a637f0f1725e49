//! Table-level schema definition.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{PgDraftError, Result};

use super::column::ColumnSchema;

/// Complete inferred schema for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Sanitized table name.
    pub table_name: String,
    /// Column schemas, unique names, in inference order.
    pub columns: Vec<ColumnSchema>,
    /// Primary-key column, if one qualified.
    #[serde(default)]
    pub primary_key: Option<String>,
}

impl TableSchema {
    /// Create a schema with the given columns and no primary key.
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
            primary_key: None,
        }
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get all column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check structural invariants: at least one column, no duplicate
    /// column names, and the primary key (when set) names an existing
    /// column.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(PgDraftError::InvalidSchema(
                "schema must have at least one column".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for col in &self.columns {
            if !seen.insert(col.name.as_str()) {
                return Err(PgDraftError::InvalidSchema(format!(
                    "duplicate column name: {}",
                    col.name
                )));
            }
        }

        if let Some(ref pk) = self.primary_key {
            if !seen.contains(pk.as_str()) {
                return Err(PgDraftError::InvalidSchema(format!(
                    "primary key '{pk}' not found in columns"
                )));
            }
        }

        Ok(())
    }
}
