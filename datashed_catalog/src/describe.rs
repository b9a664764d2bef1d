//! Plain-text rendering of nested description structures, shared by the CLI `describe` command
//! and the browser's description panel.

use serde_json::Value;

/// Render a nested key/value structure as indented `key: value` lines, two spaces per nesting
/// level. Scalars render bare (strings unquoted); arrays render in their compact JSON form.
pub fn pretty_describe(value: &Value) -> String {
    describe(value, 0)
}

fn describe(value: &Value, nestedness: usize) -> String {
    let Value::Object(map) = value else {
        return scalar(value);
    };
    let sep = format!("\n{}", " ".repeat(nestedness * 2));
    map.iter()
        .map(|(key, value)| format!("{key}: {}", describe(value, nestedness + 1)))
        .collect::<Vec<_>>()
        .join(&sep)
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
