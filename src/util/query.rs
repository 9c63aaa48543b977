//! Bracketed query-string encoding shared by the dashboard client and the API.
//!
//! Nested objects flatten into `outer[inner]=value` pairs and arrays are sent
//! once, comma-joined: `{"filter": {"status": ["todo", "done"]}}` becomes
//! `filter%5Bstatus%5D=todo%2Cdone`. [`parse`] reads the same convention back.

use serde::Serialize;
use serde_json::{Map, Value};
use url::form_urlencoded;

/// Serialize a JSON object into a query string.
///
/// Null and empty-string values are skipped, as are empty arrays. Anything
/// other than an object serializes to an empty string.
pub fn serialize(value: &Value) -> String {
    serialize_with_prefix(value, None)
}

/// Serialize with every top-level key nested under `prefix`.
pub fn serialize_with_prefix(value: &Value, prefix: Option<&str>) -> String {
    let mut pairs = Vec::new();
    if let Value::Object(map) = value {
        collect_pairs(map, prefix, &mut pairs);
    }
    pairs.join("&")
}

/// Serialize any `Serialize` type through its JSON representation.
pub fn to_query_string<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serialize(&serde_json::to_value(value)?))
}

fn collect_pairs(map: &Map<String, Value>, prefix: Option<&str>, out: &mut Vec<String>) {
    for (key, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{prefix}[{key}]"),
            None => key.clone(),
        };

        match value {
            Value::Null => {}
            Value::String(text) if text.is_empty() => {}
            Value::Object(nested) => collect_pairs(nested, Some(&path), out),
            Value::Array(items) if items.is_empty() => {}
            Value::Array(items) => out.push(encode_pair(&path, &join_items(items))),
            scalar => out.push(encode_pair(&path, &scalar_text(scalar))),
        }
    }
}

fn join_items(items: &[Value]) -> String {
    items.iter().map(scalar_text).collect::<Vec<_>>().join(",")
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => join_items(items),
        other => other.to_string(),
    }
}

fn encode_pair(key: &str, value: &str) -> String {
    format!("{}={}", encode_component(key), encode_component(value))
}

/// Characters `encodeURIComponent` leaves alone but form encoding escapes.
const URI_COMPONENT_UNRESERVED: [(&str, &str); 5] = [
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%7E", "~"),
];

/// Percent-encode a key path or value the way `encodeURIComponent` does.
/// Spaces become `%20`, not `+`.
pub fn encode_component(text: &str) -> String {
    // A literal `%` is always emitted as `%25`, so these escapes can only
    // come from the characters themselves.
    let mut encoded = form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    for (escaped, raw) in URI_COMPONENT_UNRESERVED {
        encoded = encoded.replace(escaped, raw);
    }
    encoded
}

/// Parse a bracketed query string back into a nested JSON object.
///
/// Values containing a comma become string arrays; every other value stays a
/// string. Later duplicates overwrite earlier ones.
pub fn parse(query: &str) -> Value {
    let mut root = Map::new();
    for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        let path = split_key_path(&key);
        let parsed = if value.contains(',') {
            Value::Array(
                value
                    .split(',')
                    .map(|item| Value::String(item.to_string()))
                    .collect(),
            )
        } else {
            Value::String(value.into_owned())
        };
        insert_path(&mut root, &path, parsed);
    }
    Value::Object(root)
}

/// `filter[status][in]` → `["filter", "status", "in"]`. Keys with unbalanced
/// brackets are kept verbatim.
fn split_key_path(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };
    if open == 0 {
        return vec![key.to_string()];
    }

    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            return vec![key.to_string()];
        };
        segments.push(stripped[..close].to_string());
        rest = &stripped[close + 1..];
    }
    if !rest.is_empty() {
        return vec![key.to_string()];
    }
    segments
}

fn insert_path(map: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((head, tail)) = path.split_first() else {
        return;
    };
    if tail.is_empty() {
        map.insert(head.clone(), value);
        return;
    }

    let slot = map
        .entry(head.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(nested) = slot {
        insert_path(nested, tail, value);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn arrays_are_comma_joined_and_encoded() {
        let query = serialize(&json!({"filter": {"status": ["todo", "in-progress"]}}));
        assert_eq!(query, "filter%5Bstatus%5D=todo%2Cin-progress");
    }

    #[test]
    fn nested_scalar_is_bracketed() {
        let query = serialize(&json!({"filter": {"nombre": "Juan"}}));
        assert_eq!(query, "filter%5Bnombre%5D=Juan");
    }

    #[test]
    fn null_and_empty_values_are_omitted() {
        assert_eq!(serialize(&json!({"a": null, "b": ""})), "");
        assert_eq!(serialize(&json!({"tags": []})), "");
        assert_eq!(serialize(&json!({"filter": {}})), "");
    }

    #[test]
    fn pairs_follow_traversal_order() {
        let query = serialize(&json!({
            "page": 2,
            "per_page": 25,
            "filter": {"activo": true, "area": "ventas"},
            "sort": "-created_at"
        }));
        assert_eq!(
            query,
            "page=2&per_page=25&filter%5Bactivo%5D=true&filter%5Barea%5D=ventas&sort=-created_at"
        );
    }

    #[test]
    fn spaces_and_reserved_characters_are_percent_encoded() {
        let query = serialize(&json!({"q": "a b+c&d"}));
        assert_eq!(query, "q=a%20b%2Bc%26d");
    }

    #[test]
    fn unreserved_marks_match_encode_uri_component() {
        assert_eq!(encode_component("a~b!c*d'(e)"), "a~b!c*d'(e)");
        assert_eq!(encode_component("%7E"), "%257E");
        assert_eq!(serialize(&json!({"q": "a~b"})), "q=a~b");
        assert_eq!(parse("q=a~b"), json!({"q": "a~b"}));
    }

    #[test]
    fn prefix_wraps_top_level_keys() {
        let query = serialize_with_prefix(&json!({"status": "open"}), Some("filter"));
        assert_eq!(query, "filter%5Bstatus%5D=open");
    }

    #[test]
    fn non_objects_serialize_to_nothing() {
        assert_eq!(serialize(&json!([1, 2])), "");
        assert_eq!(serialize(&json!("text")), "");
    }

    #[test]
    fn typed_filters_serialize_through_json() {
        #[derive(Serialize)]
        struct Filters {
            estado: Vec<&'static str>,
            cliente: Option<&'static str>,
        }

        #[derive(Serialize)]
        struct Listing {
            filter: Filters,
        }

        let query = to_query_string(&Listing {
            filter: Filters {
                estado: vec!["a", "b"],
                cliente: None,
            },
        })
        .expect("serialize filters");
        assert_eq!(query, "filter%5Bestado%5D=a%2Cb");
    }

    #[test]
    fn parse_rebuilds_nested_structure() {
        let parsed = parse("filter%5Bstatus%5D=todo%2Cin-progress&filter%5Bnombre%5D=Juan&page=2");
        assert_eq!(
            parsed,
            json!({
                "filter": {"status": ["todo", "in-progress"], "nombre": "Juan"},
                "page": "2"
            })
        );
    }

    #[test]
    fn parse_accepts_unencoded_brackets_and_plus_spaces() {
        let parsed = parse("?filter[nombre]=Juan+Perez&sort=-id");
        assert_eq!(
            parsed,
            json!({"filter": {"nombre": "Juan Perez"}, "sort": "-id"})
        );
    }

    #[test]
    fn malformed_bracket_keys_stay_literal() {
        let parsed = parse("filter%5Bopen=1&%5Bx%5D=2&a%5Bb%5Dc=3");
        assert_eq!(parsed, json!({"filter[open": "1", "[x]": "2", "a[b]c": "3"}));
    }

    #[test]
    fn serializing_parsed_output_is_stable() {
        let original = serialize(&json!({
            "filter": {"status": ["todo", "in-progress"], "nombre": "Juan Pérez"},
            "per_page": 15
        }));
        assert_eq!(serialize(&parse(&original)), original);
    }
}
