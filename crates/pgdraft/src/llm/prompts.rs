//! Prompt templates for type-inference requests.

use crate::inference::ColumnChunk;

/// System prompt establishing the schema-expert role.
pub fn system_prompt() -> &'static str {
    "You are a PostgreSQL database schema expert. You analyze CSV column \
     samples and suggest optimal PostgreSQL data types. You respond only \
     with valid JSON, no additional text."
}

/// Build the per-chunk inference prompt.
pub fn type_inference_prompt(chunk: &ColumnChunk) -> String {
    let sample_str = serde_json::to_string_pretty(&chunk.sample_data)
        .unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"Analyze these CSV columns and suggest optimal PostgreSQL data types.

Columns to analyze: {columns}

Sample data (first {rows} rows):
{sample}

For each column, determine:
1. The most appropriate PostgreSQL type
2. Whether the column should be nullable
3. Any constraints (UNIQUE, NOT NULL, etc.)
4. Your reasoning

Return a JSON array with this exact structure:
[
  {{
    "column_name": "column_name_here",
    "postgresql_type": "postgresql_type_here",
    "confidence": "high|medium|low",
    "reasoning": "brief explanation",
    "nullable": true,
    "constraints": [],
    "cast_rule": null
  }}
]

PostgreSQL type guidelines:
- Use INTEGER for small whole numbers, BIGINT for large ones
- Use NUMERIC(precision, scale) for decimals requiring exact precision
- Use VARCHAR(n) for bounded strings, TEXT for unbounded
- Use TIMESTAMPTZ for timestamps, DATE for dates without time
- Use UUID for UUID patterns
- Use BOOLEAN for true/false values
- Use JSONB for JSON data
- Consider NULL percentage when setting nullable

Respond ONLY with the JSON array, no additional text."#,
        columns = chunk.columns.join(", "),
        rows = chunk.sample_data.len(),
        sample = sample_str,
    )
}
