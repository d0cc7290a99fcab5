//! Request parameter sanitization.
//!
//! Transforms an arbitrary, untrusted, possibly-nested parameter structure
//! into one safe to log and store, without destroying its diagnostic shape:
//! sensitive values become deterministic digests, SQL string literals become
//! placeholders, and oversized strings are capped.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use tally_core::policy::SensitiveKeyDetector;

/// Ceiling on stored string parameters (10 KiB).
pub const MAX_STRING_LEN: usize = 10 * 1024;

/// Marker appended to truncated strings.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Placeholder substituted for SQL string literals.
pub const SQL_LITERAL_PLACEHOLDER: &str = "'?'";

/// Matches a single-quoted SQL string literal, treating a doubled quote
/// (`''`) as an escape that continues the same literal.
static SQL_LITERAL_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"'(?:[^']|'')*'").expect("SQL literal pattern must compile")
});

/// Sanitize a tool call's arguments for storage.
///
/// Returns `None` for absent, non-object, or empty input; the persistence
/// layer writes `None` as SQL NULL, so an empty-but-present object never
/// reaches storage.
pub fn sanitize_params(
    params: &Value,
    detector: &dyn SensitiveKeyDetector,
) -> Option<Map<String, Value>> {
    match params {
        Value::Object(map) if !map.is_empty() => Some(sanitize_map(map, detector)),
        _ => None,
    }
}

fn sanitize_map(map: &Map<String, Value>, detector: &dyn SensitiveKeyDetector) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), sanitize_value(key, value, detector)))
        .collect()
}

fn sanitize_value(key: &str, value: &Value, detector: &dyn SensitiveKeyDetector) -> Value {
    if detector.is_sensitive(key) {
        return Value::String(hash_sensitive(value));
    }

    match value {
        Value::String(s) => {
            let capped = truncate_string(s, MAX_STRING_LEN);
            if is_sql_key(key) {
                Value::String(redact_sql_literals(&capped))
            } else {
                Value::String(capped)
            }
        }
        Value::Object(nested) => Value::Object(sanitize_map(nested, detector)),
        // Numbers, booleans, null, and arrays pass through unchanged.
        other => other.clone(),
    }
}

/// Whether a parameter key carries SQL text.
fn is_sql_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key == "sql" || key == "query" || key.ends_with("_sql") || key.ends_with("_query")
}

/// Replace every single-quoted string literal with [`SQL_LITERAL_PLACEHOLDER`].
///
/// Keywords, identifiers, numeric literals, and punctuation are left
/// byte-for-byte unchanged. A doubled quote inside a literal (`'it''s'`) is
/// consumed as part of that literal rather than terminating the match.
pub fn redact_sql_literals(sql: &str) -> String {
    SQL_LITERAL_RE
        .replace_all(sql, SQL_LITERAL_PLACEHOLDER)
        .into_owned()
}

/// Deterministic one-way digest of a sensitive value.
///
/// Identical inputs produce identical tags, so repeated occurrences of the
/// same secret can be correlated across audit entries without storing the
/// secret itself.
pub fn hash_sensitive(value: &Value) -> String {
    let mut hasher = Sha256::new();
    match value {
        Value::String(s) => hasher.update(s.as_bytes()),
        other => hasher.update(other.to_string().as_bytes()),
    }
    let digest = format!("{:x}", hasher.finalize());
    format!("sha256:{}", &digest[..16])
}

/// Cap a string at `ceiling` bytes, appending the truncation marker when cut.
pub fn truncate_string(s: &str, ceiling: usize) -> String {
    if s.len() <= ceiling {
        return s.to_string();
    }
    let mut end = ceiling;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &s[..end], TRUNCATION_MARKER)
}
