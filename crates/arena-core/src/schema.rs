//! Validation of untrusted conversation payloads
//!
//! Boundary layers hand raw JSON to [`validate`] and get back either the typed
//! [`Conversation`] or one error string per violated field. Field errors are
//! reported as dotted paths (`messages.0.role`); root-level problems as a message.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::conversation::{Conversation, Role};

const ATTACHMENT_KINDS: [&str; 5] = ["file", "image", "audio", "video", "url"];
const ARTIFACT_KINDS: [&str; 7] = ["doc", "code", "image", "audio", "video", "archive", "other"];

/// Outcome of validating a raw conversation payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Conversation>,
}

impl ValidationResult {
    fn ok(data: Conversation) -> Self {
        Self {
            valid: true,
            errors: None,
            data: Some(data),
        }
    }

    fn invalid(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors: Some(errors),
            data: None,
        }
    }

    /// Errors as a slice, empty when valid
    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or(&[])
    }
}

/// Validate an arbitrary JSON value against the conversation schema
pub fn validate(raw: &Value) -> ValidationResult {
    let Some(obj) = raw.as_object() else {
        return ValidationResult::invalid(vec![format!(
            "Expected object, received {}",
            type_name(raw)
        )]);
    };

    let mut errors = Vec::new();

    require_string(obj, "sessionId", "", &mut errors);

    match obj.get("messages") {
        Some(Value::Array(messages)) => {
            for (i, message) in messages.iter().enumerate() {
                check_message(message, &format!("messages.{}", i), &mut errors);
            }
        }
        _ => errors.push("messages".to_string()),
    }

    if let Some(artifacts) = optional(obj, "artifacts") {
        match artifacts {
            Value::Array(items) => {
                for (i, artifact) in items.iter().enumerate() {
                    check_artifact(artifact, &format!("artifacts.{}", i), &mut errors);
                }
            }
            _ => errors.push("artifacts".to_string()),
        }
    }

    optional_object(obj, "scratch", "", &mut errors);
    optional_string_array(obj, "tags", "", &mut errors);
    optional_string(obj, "locale", "", &mut errors);
    optional_string(obj, "timezone", "", &mut errors);

    if !errors.is_empty() {
        return ValidationResult::invalid(errors);
    }

    match serde_json::from_value::<Conversation>(raw.clone()) {
        Ok(conversation) => ValidationResult::ok(conversation),
        Err(e) => ValidationResult::invalid(vec![e.to_string()]),
    }
}

fn check_message(value: &Value, path: &str, errors: &mut Vec<String>) {
    let Some(obj) = value.as_object() else {
        errors.push(path.to_string());
        return;
    };

    optional_string(obj, "id", path, errors);

    let role_ok = obj
        .get("role")
        .and_then(Value::as_str)
        .map(|r| r.parse::<Role>().is_ok())
        .unwrap_or(false);
    if !role_ok {
        errors.push(join(path, "role"));
    }

    require_string(obj, "content", path, errors);
    optional_string(obj, "name", path, errors);
    optional_string(obj, "timestamp", path, errors);

    if let Some(attachments) = optional(obj, "attachments") {
        let attachments_path = join(path, "attachments");
        match attachments {
            Value::Array(items) => {
                for (i, attachment) in items.iter().enumerate() {
                    check_attachment(attachment, &format!("{}.{}", attachments_path, i), errors);
                }
            }
            _ => errors.push(attachments_path),
        }
    }

    optional_string_array(obj, "citations", path, errors);
    optional_object(obj, "meta", path, errors);
}

fn check_attachment(value: &Value, path: &str, errors: &mut Vec<String>) {
    let Some(obj) = value.as_object() else {
        errors.push(path.to_string());
        return;
    };
    require_one_of(obj, "kind", &ATTACHMENT_KINDS, path, errors);
    require_string(obj, "uri", path, errors);
    optional_string(obj, "title", path, errors);
    optional_object(obj, "meta", path, errors);
}

fn check_artifact(value: &Value, path: &str, errors: &mut Vec<String>) {
    let Some(obj) = value.as_object() else {
        errors.push(path.to_string());
        return;
    };
    require_string(obj, "id", path, errors);
    require_one_of(obj, "kind", &ARTIFACT_KINDS, path, errors);
    require_string(obj, "uri", path, errors);
    optional_string(obj, "title", path, errors);
    optional_object(obj, "meta", path, errors);
}

fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", path, field)
    }
}

/// A present, non-null field
fn optional<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}

fn require_string(obj: &Map<String, Value>, field: &str, path: &str, errors: &mut Vec<String>) {
    if !obj.get(field).map(Value::is_string).unwrap_or(false) {
        errors.push(join(path, field));
    }
}

fn require_one_of(
    obj: &Map<String, Value>,
    field: &str,
    allowed: &[&str],
    path: &str,
    errors: &mut Vec<String>,
) {
    let ok = obj
        .get(field)
        .and_then(Value::as_str)
        .map(|v| allowed.contains(&v))
        .unwrap_or(false);
    if !ok {
        errors.push(join(path, field));
    }
}

fn optional_string(obj: &Map<String, Value>, field: &str, path: &str, errors: &mut Vec<String>) {
    if optional(obj, field).is_some_and(|v| !v.is_string()) {
        errors.push(join(path, field));
    }
}

fn optional_object(obj: &Map<String, Value>, field: &str, path: &str, errors: &mut Vec<String>) {
    if optional(obj, field).is_some_and(|v| !v.is_object()) {
        errors.push(join(path, field));
    }
}

fn optional_string_array(
    obj: &Map<String, Value>,
    field: &str,
    path: &str,
    errors: &mut Vec<String>,
) {
    let Some(value) = optional(obj, field) else {
        return;
    };
    let field_path = join(path, field);
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    errors.push(format!("{}.{}", field_path, i));
                }
            }
        }
        _ => errors.push(field_path),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_conversation() {
        let raw = json!({
            "sessionId": "abc",
            "messages": [
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello", "meta": { "k": 1 } }
            ],
            "tags": ["demo"]
        });

        let result = validate(&raw);
        assert!(result.valid);
        assert!(result.errors.is_none());
        let data = result.data.unwrap();
        assert_eq!(data.session_id, "abc");
        assert_eq!(data.messages.len(), 2);
    }

    #[test]
    fn test_rejects_unknown_role() {
        let raw = json!({
            "sessionId": "abc",
            "messages": [
                { "role": "user", "content": "hi" },
                { "role": "moderator", "content": "order!" }
            ]
        });

        let result = validate(&raw);
        assert!(!result.valid);
        assert_eq!(result.errors(), ["messages.1.role"]);
        assert!(result.data.is_none());
    }

    #[test]
    fn test_rejects_missing_session_id() {
        let raw = json!({ "messages": [] });

        let result = validate(&raw);
        assert!(!result.valid);
        assert_eq!(result.errors(), ["sessionId"]);
    }

    #[test]
    fn test_reports_one_error_per_field() {
        let raw = json!({
            "sessionId": 7,
            "messages": [{ "role": "user", "content": 3, "citations": ["ok", 1] }],
            "locale": false
        });

        let result = validate(&raw);
        assert_eq!(
            result.errors(),
            [
                "sessionId",
                "messages.0.content",
                "messages.0.citations.1",
                "locale"
            ]
        );
    }

    #[test]
    fn test_rejects_non_object() {
        let result = validate(&json!([1, 2]));
        assert!(!result.valid);
        assert_eq!(result.errors(), ["Expected object, received array"]);
    }

    #[test]
    fn test_attachment_and_artifact_kinds() {
        let raw = json!({
            "sessionId": "abc",
            "messages": [{
                "role": "user",
                "content": "see file",
                "attachments": [{ "kind": "hologram", "uri": "x" }]
            }],
            "artifacts": [{ "id": "a1", "kind": "code", "uri": "file://main.rs" }]
        });

        let result = validate(&raw);
        assert_eq!(result.errors(), ["messages.0.attachments.0.kind"]);
    }
}
