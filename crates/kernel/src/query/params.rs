//! URL query-string assembly for forwarded Salesforce API calls.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use super::filters::is_supplied;
use super::types::FilterSet;
use super::value::coerce_to_string;

/// Characters escaped in a URI component: everything except ASCII
/// alphanumerics and `- _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Build a query string (no leading `?`) from fixed and optional parameters.
///
/// `base_params` are emitted first, verbatim and in order. Each supplied entry
/// of `params` follows as `key=value` with the value percent-encoded, in the
/// insertion order of `params`. Segments are joined with `&`.
pub fn build_query_params(params: &FilterSet, base_params: &[&str]) -> String {
    let mut segments: Vec<String> = base_params.iter().map(|s| (*s).to_string()).collect();

    for (key, value) in params {
        if is_supplied(value) {
            segments.push(format!(
                "{key}={}",
                utf8_percent_encode(&coerce_to_string(value), URI_COMPONENT)
            ));
        }
    }

    segments.join("&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn params(value: Value) -> FilterSet {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn base_params_come_first() {
        let qs = build_query_params(&params(json!({"a": "1", "b": ""})), &["base=1"]);
        assert_eq!(qs, "base=1&a=1");
    }

    #[test]
    fn empty_inputs_give_empty_string() {
        assert_eq!(build_query_params(&FilterSet::new(), &[]), "");
        assert_eq!(
            build_query_params(&params(json!({"a": null, "b": ""})), &[]),
            ""
        );
    }

    #[test]
    fn values_are_percent_encoded() {
        let qs = build_query_params(
            &params(json!({"entityName": "Account & Contact", "q": "a=b/c"})),
            &[],
        );
        assert_eq!(qs, "entityName=Account%20%26%20Contact&q=a%3Db%2Fc");
    }

    #[test]
    fn uri_component_marks_stay_literal() {
        let qs = build_query_params(&params(json!({"k": "a b!*'()-_.~"})), &[]);
        assert_eq!(qs, "k=a%20b!*'()-_.~");

        let qs = build_query_params(&params(json!({"k": "#?+;,:@$"})), &[]);
        assert_eq!(qs, "k=%23%3F%2B%3B%2C%3A%40%24");
    }

    #[test]
    fn non_ascii_is_utf8_encoded() {
        let qs = build_query_params(&params(json!({"name": "Zürich"})), &[]);
        assert_eq!(qs, "name=Z%C3%BCrich");
    }

    #[test]
    fn falsy_but_supplied_values_are_kept() {
        let qs = build_query_params(&params(json!({"limit": 0, "active": false})), &[]);
        assert_eq!(qs, "limit=0&active=false");
    }

    #[test]
    fn follows_parameter_insertion_order() {
        let qs = build_query_params(
            &params(json!({"entityCategory": "Profile", "entityName": "Individual"})),
            &["offset=0", "limit=50"],
        );
        assert_eq!(
            qs,
            "offset=0&limit=50&entityCategory=Profile&entityName=Individual"
        );
    }
}
