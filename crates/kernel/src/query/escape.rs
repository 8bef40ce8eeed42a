//! SQL string literal escaping.
//!
//! Sanitizes a value for inline embedding inside a single-quoted SQL literal.
//! The Data Cloud query API takes plain SQL text with no parameter binding,
//! so this is the only barrier between filter input and the query text. It is
//! not a substitute for parameterized queries.

use serde_json::Value;

use super::value::coerce_to_string;

/// Escape a string for a single-quoted SQL literal.
///
/// Rules apply once each, in order, to the whole string:
/// `'` -> `''`, `\` -> `\\`, NUL removed, LF -> `\n`, CR -> `\r`,
/// SUB (0x1A) -> `\Z`. Quotes are doubled before backslashes so the later
/// rules never re-escape earlier output.
pub fn escape_sql_string(value: &str) -> String {
    value
        .replace('\'', "''")
        .replace('\\', "\\\\")
        .replace('\0', "")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\x1a', "\\Z")
}

/// Escape an arbitrary filter value, coercing it to text first.
pub fn escape_sql_value(value: &Value) -> String {
    escape_sql_string(&coerce_to_string(value))
}
