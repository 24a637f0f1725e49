//! Sampled CSV data and per-column sample views.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single sampled row: header name to cell value, in header order.
///
/// `None` marks a cell that was empty (or whitespace-only) in the
/// source.
pub type SampleRow = IndexMap<String, Option<String>>;

/// Detected properties of a CSV file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvProperties {
    /// Column delimiter.
    pub delimiter: u8,
    /// File encoding.
    pub encoding: String,
    /// Quote character.
    pub quote_char: u8,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Total row count, when cheaply known.
    pub row_count: Option<usize>,
    /// Number of columns.
    pub column_count: usize,
}

/// Sampled CSV data: headers plus the first N data rows.
///
/// Built once per inference run by [`SampleReader`]; immutable
/// afterward.
///
/// [`SampleReader`]: super::SampleReader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvSample {
    /// Path to the source file.
    pub path: PathBuf,
    /// Detected file properties.
    pub properties: CsvProperties,
    /// Column headers in file order.
    pub headers: Vec<String>,
    /// Sampled rows as header-keyed maps.
    pub rows: Vec<SampleRow>,
    /// Number of rows actually sampled.
    pub sample_size: usize,
}

impl CsvSample {
    /// Project the sampled rows down to a subset of columns.
    ///
    /// Missing keys per row are omitted rather than filled.
    pub fn project_columns(&self, column_names: &[String]) -> Vec<SampleRow> {
        self.rows
            .iter()
            .map(|row| {
                column_names
                    .iter()
                    .filter_map(|col| row.get(col).map(|v| (col.clone(), v.clone())))
                    .collect()
            })
            .collect()
    }

    /// Build one [`ColumnSample`] per header from the sampled rows.
    pub fn column_samples(&self) -> Vec<ColumnSample> {
        self.headers
            .iter()
            .map(|name| {
                let values: Vec<Option<String>> = self
                    .rows
                    .iter()
                    .map(|row| row.get(name).cloned().flatten())
                    .collect();
                let null_count = values
                    .iter()
                    .filter(|v| match v {
                        None => true,
                        Some(s) => s.trim().is_empty(),
                    })
                    .count();
                let total_count = values.len();

                ColumnSample {
                    name: name.clone(),
                    values,
                    null_count,
                    total_count,
                }
            })
            .collect()
    }
}

/// One source column's observed sample data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSample {
    /// Raw header string.
    pub name: String,
    /// Sampled values in row order, nulls included.
    pub values: Vec<Option<String>>,
    /// Number of null values.
    pub null_count: usize,
    /// Total number of sampled values.
    pub total_count: usize,
}

impl ColumnSample {
    /// Percentage of null values, 0.0 for an empty sample.
    pub fn null_percentage(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            (self.null_count as f64 / self.total_count as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_sample() -> CsvSample {
        let headers = vec!["id".to_string(), "name".to_string()];
        let rows = vec![
            IndexMap::from([
                ("id".to_string(), Some("1".to_string())),
                ("name".to_string(), Some("alice".to_string())),
            ]),
            IndexMap::from([
                ("id".to_string(), Some("2".to_string())),
                ("name".to_string(), None),
            ]),
        ];
        CsvSample {
            path: PathBuf::from("test.csv"),
            properties: CsvProperties {
                delimiter: b',',
                encoding: "utf-8".to_string(),
                quote_char: b'"',
                has_header: true,
                row_count: Some(2),
                column_count: 2,
            },
            headers,
            rows,
            sample_size: 2,
        }
    }

    #[test]
    fn test_column_samples() {
        let sample = make_sample();
        let cols = sample.column_samples();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].name, "id");
        assert_eq!(cols[0].null_count, 0);
        assert_eq!(cols[1].null_count, 1);
        assert_eq!(cols[1].total_count, 2);
    }

    #[test]
    fn test_null_percentage() {
        let sample = make_sample();
        let cols = sample.column_samples();
        assert_eq!(cols[0].null_percentage(), 0.0);
        assert_eq!(cols[1].null_percentage(), 50.0);

        let empty = ColumnSample {
            name: "x".to_string(),
            values: vec![],
            null_count: 0,
            total_count: 0,
        };
        assert_eq!(empty.null_percentage(), 0.0);
    }

    #[test]
    fn test_project_columns() {
        let sample = make_sample();
        let projected = sample.project_columns(&["name".to_string()]);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected[0].len(), 1);
        assert!(projected[0].contains_key("name"));
        assert!(!projected[0].contains_key("id"));
    }

    #[test]
    fn test_project_omits_missing_keys() {
        let sample = make_sample();
        let projected = sample.project_columns(&["missing".to_string()]);
        assert!(projected.iter().all(|row| row.is_empty()));
    }
}
