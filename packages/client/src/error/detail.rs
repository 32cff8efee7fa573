//! Extraction of structured error detail from response bodies
//!
//! Servers report failures either as `{"detail": "message"}` or as
//! `{"detail": [{"msg": "..."}, ...]}`. Array entries are joined with `"; "`.

use serde_json::Value;

/// Extracts a human-readable detail message from an error response body.
///
/// Returns `None` when the body is not JSON or carries no recognizable field.
#[must_use]
pub fn extract_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let object = value.as_object()?;

    match object.get("detail") {
        Some(Value::String(message)) => Some(message.clone()),
        Some(Value::Array(entries)) => {
            let parts: Vec<String> = entries.iter().filter_map(entry_message).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        Some(other) if !other.is_null() => Some(other.to_string()),
        _ => object
            .get("message")
            .or_else(|| object.get("error"))
            .and_then(Value::as_str)
            .map(str::to_owned),
    }
}

fn entry_message(entry: &Value) -> Option<String> {
    match entry {
        Value::String(message) => Some(message.clone()),
        Value::Object(fields) => fields
            .get("msg")
            .or_else(|| fields.get("message"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or_else(|| Some(entry.to_string())),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_string_detail() {
        assert_eq!(
            extract_detail(br#"{"detail":"Not authenticated"}"#).as_deref(),
            Some("Not authenticated")
        );
    }

    #[test]
    fn array_detail_is_joined() {
        let body = br#"{"detail":[{"loc":["body","file"],"msg":"field required"},{"msg":"value too long"}]}"#;
        assert_eq!(
            extract_detail(body).as_deref(),
            Some("field required; value too long")
        );
    }

    #[test]
    fn falls_back_to_message_field() {
        assert_eq!(
            extract_detail(br#"{"message":"quota exceeded"}"#).as_deref(),
            Some("quota exceeded")
        );
    }

    #[test]
    fn non_json_bodies_have_no_detail() {
        assert_eq!(extract_detail(b"<html>Bad Gateway</html>"), None);
    }
}
