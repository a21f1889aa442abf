//! Log redaction for identifiers and tool arguments.
//!
//! Only log output goes through here; request bodies are never modified.

use serde_json::Value;

/// Key fragments whose values are always secrets.
const SECRET_KEY_HINTS: &[&str] = &["token", "secret"];

/// Key fragments whose string values carry user note content.
const CONTENT_KEY_HINTS: &[&str] = &["text", "content", "reminder", "subject", "description"];

/// Mask an identifier for logging, keeping the last four characters.
pub fn mask_identifier(value: &str) -> String {
    let count = value.chars().count();
    if count == 0 {
        return "<unset>".to_string();
    }
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

/// Deep-copy a JSON value with secrets and note content replaced.
pub fn sanitize_args(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(sanitize_args).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let lower = key.to_lowercase();
                    if SECRET_KEY_HINTS.iter().any(|hint| lower.contains(hint)) {
                        return (key.clone(), Value::String("<redacted>".to_string()));
                    }
                    if value.is_string()
                        && CONTENT_KEY_HINTS.iter().any(|hint| lower.contains(hint))
                    {
                        return (key.clone(), Value::String("<redacted>".to_string()));
                    }
                    (key.clone(), sanitize_args(value))
                })
                .collect(),
        ),
        other => other.clone(),
    }
}
