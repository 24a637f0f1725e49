//! CSV sampler with delimiter auto-detection.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{PgDraftError, Result};

use super::sample::{CsvProperties, CsvSample, SampleRow};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Sampler configuration.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum data rows to sample.
    pub max_rows: usize,
    /// Quote character.
    pub quote: u8,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: 100,
            quote: b'"',
        }
    }
}

/// Reads the head of a CSV file into a [`CsvSample`].
pub struct SampleReader {
    config: SampleConfig,
}

impl SampleReader {
    /// Create a reader with default configuration.
    pub fn new() -> Self {
        Self {
            config: SampleConfig::default(),
        }
    }

    /// Create a reader with custom configuration.
    pub fn with_config(config: SampleConfig) -> Self {
        Self { config }
    }

    /// Sample a CSV file: detect properties, read headers and up to
    /// `max_rows` data rows.
    pub fn sample_file(&self, path: impl AsRef<Path>) -> Result<CsvSample> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| PgDraftError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| PgDraftError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents)?,
        };

        let (headers, rows) = self.parse_bytes(&contents, delimiter)?;

        info!(
            rows = rows.len(),
            columns = headers.len(),
            file = %path.display(),
            "sampled CSV file"
        );

        let properties = CsvProperties {
            delimiter,
            encoding: "utf-8".to_string(),
            quote_char: self.config.quote,
            has_header: true,
            row_count: None,
            column_count: headers.len(),
        };

        let sample_size = rows.len();
        Ok(CsvSample {
            path: path.to_path_buf(),
            properties,
            headers,
            rows,
            sample_size,
        })
    }

    /// Parse raw bytes into headers and header-keyed sample rows.
    fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<(Vec<String>, Vec<SampleRow>)> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();

        if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
            return Err(PgDraftError::EmptyData("no columns found".to_string()));
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            if rows.len() >= self.config.max_rows {
                break;
            }

            let record = result?;
            let row: SampleRow = headers
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = record.get(i).map(|s| s.trim()).filter(|s| !s.is_empty());
                    (name.clone(), value.map(|s| s.to_string()))
                })
                .collect::<IndexMap<_, _>>();
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(PgDraftError::EmptyData("no data rows found".to_string()));
        }

        Ok((headers, rows))
    }
}

impl Default for SampleReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Detect the delimiter by analyzing the first few lines.
///
/// For each candidate, counts quote-aware occurrences per line; a
/// delimiter that appears a consistent nonzero number of times per line
/// scores highest. Tabs get a small bonus since they rarely occur in
/// actual data.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(PgDraftError::EmptyData("no lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0usize;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    debug!(delimiter = %(best_delimiter as char), "detected delimiter");
    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}
