//! Filter set cleaning.

use serde_json::Value;

use super::types::FilterSet;

/// Whether a filter value was actually supplied.
///
/// Only `null` and the exact empty string count as missing; `0`, `false`
/// and empty arrays are real values.
pub fn is_supplied(value: &Value) -> bool {
    !(value.is_null() || value.as_str() == Some(""))
}

/// Drop entries whose value is `null` or `""`, keeping everything else.
///
/// Returns a new set; the input is left untouched. Absent keys never appear
/// in a [`FilterSet`] in the first place.
pub fn clean_filters(filters: &FilterSet) -> FilterSet {
    filters
        .iter()
        .filter(|(_, value)| is_supplied(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
