//! Column chunking for batched inference requests.
//!
//! Wide CSVs are split into bounded-size column groups so a single
//! inference request never carries more than `chunk_size` columns.
//! Two strategies exist: fixed consecutive splitting, and a smart
//! variant that keeps columns sharing a naming prefix together.
//!
//! Invariant for both: every input column lands in exactly one chunk,
//! chunk ids run 0..N-1 in order, and every chunk carries the final
//! chunk count.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PgDraftError, Result};
use crate::input::{CsvSample, SampleRow};

/// Rows of sample data carried per chunk in downstream requests.
pub const MAX_PREVIEW_ROWS: usize = 20;

/// A bounded group of columns processed in one inference request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnChunk {
    /// 0-based chunk identifier.
    pub chunk_id: usize,
    /// Total number of chunks in this run.
    pub total_chunks: usize,
    /// Raw header names assigned to this chunk.
    pub columns: Vec<String>,
    /// Sample rows projected down to this chunk's columns.
    pub sample_data: Vec<SampleRow>,
}

/// Split columns into consecutive chunks of at most `chunk_size`.
///
/// The last chunk may be smaller. Fails on an empty column list.
pub fn chunk_columns(sample: &CsvSample, chunk_size: usize) -> Result<Vec<ColumnChunk>> {
    let columns = &sample.headers;
    let total_columns = columns.len();

    if total_columns == 0 {
        return Err(PgDraftError::EmptyData("no columns to chunk".to_string()));
    }

    let chunk_size = chunk_size.max(1);
    let total_chunks = total_columns.div_ceil(chunk_size);

    let chunks = columns
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, group)| build_chunk(sample, i, total_chunks, group.to_vec()))
        .collect();

    debug!(
        columns = total_columns,
        chunks = total_chunks,
        chunk_size,
        "split columns into fixed chunks"
    );

    Ok(chunks)
}

/// Split columns into chunks, keeping related columns together.
///
/// Columns are grouped by naming prefix (the substring before the
/// first `_`; names without one fall into a synthetic `other` bucket),
/// preserving first-seen group order. Whole groups are packed greedily
/// into a running chunk while they fit; a group that would overflow
/// closes the current chunk first, and a group larger than
/// `chunk_size` is split into consecutive sub-chunks of exactly
/// `chunk_size` (except possibly the last).
pub fn chunk_columns_smart(sample: &CsvSample, chunk_size: usize) -> Result<Vec<ColumnChunk>> {
    let columns = &sample.headers;
    let total_columns = columns.len();

    if total_columns == 0 {
        return Err(PgDraftError::EmptyData("no columns to chunk".to_string()));
    }

    let chunk_size = chunk_size.max(1);

    // Group by prefix, first-seen order.
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    for col in columns {
        let prefix = match col.split_once('_') {
            Some((prefix, _)) => prefix.to_string(),
            None => "other".to_string(),
        };
        groups.entry(prefix).or_default().push(col.clone());
    }

    let mut chunks_data: Vec<Vec<String>> = Vec::new();
    let mut current_chunk: Vec<String> = Vec::new();

    for (_, group_columns) in groups {
        if current_chunk.len() + group_columns.len() > chunk_size {
            if !current_chunk.is_empty() {
                chunks_data.push(std::mem::take(&mut current_chunk));
            }

            if group_columns.len() > chunk_size {
                for sub in group_columns.chunks(chunk_size) {
                    chunks_data.push(sub.to_vec());
                }
            } else {
                current_chunk = group_columns;
            }
        } else {
            current_chunk.extend(group_columns);
        }
    }

    if !current_chunk.is_empty() {
        chunks_data.push(current_chunk);
    }

    let total_chunks = chunks_data.len();
    let chunks = chunks_data
        .into_iter()
        .enumerate()
        .map(|(i, group)| build_chunk(sample, i, total_chunks, group))
        .collect();

    debug!(
        columns = total_columns,
        chunks = total_chunks,
        chunk_size,
        "smart-chunked columns by prefix"
    );

    Ok(chunks)
}

fn build_chunk(
    sample: &CsvSample,
    chunk_id: usize,
    total_chunks: usize,
    columns: Vec<String>,
) -> ColumnChunk {
    let mut sample_data = sample.project_columns(&columns);
    sample_data.truncate(MAX_PREVIEW_ROWS);

    ColumnChunk {
        chunk_id,
        total_chunks,
        columns,
        sample_data,
    }
}
