//! Conventions for tool output field maps.

use serde_json::Value;
use toolforge_primitives::FieldMap;

/// Boolean flag reporting whether processing succeeded.
pub const SUCCESS_FIELD: &str = "success";
/// Message describing a failure.
pub const ERROR_FIELD: &str = "error";

/// Marks `fields` as a successful result.
#[must_use]
pub fn success(mut fields: FieldMap) -> FieldMap {
    fields.insert(SUCCESS_FIELD.into(), Value::Bool(true));
    fields
}

/// Builds a failure result carrying `message`.
#[must_use]
pub fn failure(message: impl Into<String>) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(SUCCESS_FIELD.into(), Value::Bool(false));
    fields.insert(ERROR_FIELD.into(), Value::String(message.into()));
    fields
}

/// Returns `true` when the output's success flag is set.
#[must_use]
pub fn is_success(fields: &FieldMap) -> bool {
    fields
        .get(SUCCESS_FIELD)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Returns the failure message, if any.
#[must_use]
pub fn error_message(fields: &FieldMap) -> Option<&str> {
    fields.get(ERROR_FIELD).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_keeps_tool_fields() {
        let mut fields = FieldMap::new();
        fields.insert("digest".into(), Value::from("abc"));
        let out = success(fields);
        assert!(is_success(&out));
        assert_eq!(out.get("digest"), Some(&Value::from("abc")));
    }

    #[test]
    fn failure_carries_message() {
        let out = failure("invalid json");
        assert!(!is_success(&out));
        assert_eq!(error_message(&out), Some("invalid json"));
    }

    #[test]
    fn missing_flag_is_not_success() {
        assert!(!is_success(&FieldMap::new()));
    }
}
