//! JSON-LD helpers over parsed `serde_json` values.

use serde_json::Value;

/// Collect every `@type` value in `value`, recursing into nested objects and arrays.
/// Types are appended in document order; duplicates are kept out.
pub fn collect_types(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(types) = map.get("@type") {
                for t in type_names(types) {
                    if !out.iter().any(|seen| seen == t) {
                        out.push(t.to_string());
                    }
                }
            }
            for (key, nested) in map {
                if key != "@type" {
                    collect_types(nested, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_types(item, out);
            }
        }
        _ => {}
    }
}

/// `@type` may be a string or an array of strings.
pub fn type_names(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Top-level entities of a block: array items, `@graph` members, or the block itself.
pub fn entities(block: &Value) -> Vec<&serde_json::Map<String, Value>> {
    match block {
        Value::Array(items) => items.iter().flat_map(entities).collect(),
        Value::Object(map) => match map.get("@graph") {
            Some(Value::Array(graph)) => graph.iter().filter_map(Value::as_object).collect(),
            _ => vec![map],
        },
        _ => Vec::new(),
    }
}

/// True when a string field is present and non-blank, or any other non-null value is present.
pub fn has_field(entity: &serde_json::Map<String, Value>, field: &str) -> bool {
    match entity.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}
