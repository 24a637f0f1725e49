//! Identifier sanitization for column and table names.
//!
//! Raw CSV headers are arbitrary strings; PostgreSQL identifiers are not.
//! [`sanitize_identifier`] maps any input to a valid, keyword-safe,
//! lowercase identifier. The function is total, deterministic, and
//! idempotent: `sanitize_identifier(sanitize_identifier(x)) ==
//! sanitize_identifier(x)` for every input.

/// Reserved SQL keywords that cannot be used bare as column names.
///
/// Matching is done on the already-lowercased identifier.
const RESERVED_KEYWORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc",
    "asymmetric", "authorization", "between", "binary", "both", "case",
    "cast", "check", "collate", "column", "constraint", "create", "cross",
    "current_date", "current_time", "current_timestamp", "current_user",
    "default", "deferrable", "desc", "distinct", "do", "else", "end",
    "except", "false", "for", "foreign", "from", "full", "grant", "group",
    "having", "in", "initially", "inner", "intersect", "into", "is", "join",
    "leading", "left", "like", "limit", "localtime", "localtimestamp",
    "natural", "not", "null", "offset", "on", "only", "or", "order",
    "outer", "overlaps", "placing", "primary", "references", "returning",
    "right", "select", "session_user", "similar", "some", "symmetric",
    "table", "then", "to", "trailing", "true", "union", "unique", "user",
    "using", "when", "where", "window", "with",
];

/// Normalize a raw header string into a valid PostgreSQL identifier.
///
/// Applied in order: lowercase; replace every character outside
/// `[a-z0-9_]` with `_`; collapse runs of `_`; strip leading/trailing
/// `_`; prepend `col_` when the result starts with a digit; substitute
/// `unnamed_column` when the result is empty; append `_col` when the
/// result is a reserved SQL keyword.
pub fn sanitize_identifier(name: &str) -> String {
    let lowered = name.to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    let mut last_underscore = false;
    for ch in lowered.chars() {
        let mapped = if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            ch
        } else {
            '_'
        };
        if mapped == '_' {
            if !last_underscore {
                out.push('_');
            }
            last_underscore = true;
        } else {
            out.push(mapped);
            last_underscore = false;
        }
    }

    let trimmed = out.trim_matches('_');

    let mut result = if trimmed.is_empty() {
        "unnamed_column".to_string()
    } else if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("col_{trimmed}")
    } else {
        trimmed.to_string()
    };

    if RESERVED_KEYWORDS.contains(&result.as_str()) {
        result.push_str("_col");
    }

    result
}

/// Derive a table name from a file stem.
///
/// Same rules as column names; a file called `My Data-2024.csv` maps to
/// the table `my_data_2024`.
pub fn sanitize_table_name(stem: &str) -> String {
    sanitize_identifier(stem)
}

/// Deduplicate a sequence of sanitized names in first-seen order.
///
/// Sanitization is not injective (`"A.B"` and `"A-B"` both map to
/// `a_b`), so repeats get a numeric suffix: `a_b`, `a_b_2`, `a_b_3`.
/// The suffixed form is itself checked against earlier names so the
/// output is always collision-free.
pub fn dedupe_names(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        if seen.insert(name.clone()) {
            out.push(name.clone());
            continue;
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{name}_{n}");
            if seen.insert(candidate.clone()) {
                out.push(candidate);
                break;
            }
            n += 1;
        }
    }

    out
}
