//! Payload canonicalisation and revival

use serde::Serialize;
use serde_json::Value;

use crate::{SessionError, SessionResult};

/// Bytes that get signed and encrypted for a payload.
///
/// Strings pass through unchanged; any other JSON value is serialized
/// compactly with object keys in sorted order.
pub fn canonical_bytes(payload: &Value) -> SessionResult<Vec<u8>> {
    match payload {
        Value::String(s) => Ok(s.as_bytes().to_vec()),
        other => serde_json::to_vec(other)
            .map_err(|e| SessionError::Format(format!("payload is not serializable: {e}"))),
    }
}

/// Canonicalise any serializable value
pub fn to_payload<T: Serialize + ?Sized>(value: &T) -> SessionResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| SessionError::Format(format!("payload is not serializable: {e}")))
}

/// Turn decrypted bytes back into a payload: JSON when the text parses,
/// otherwise the raw text.
pub fn revive(data: &[u8]) -> Value {
    let text = String::from_utf8_lossy(data);
    serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strings_pass_through() {
        assert_eq!(canonical_bytes(&json!("ABC123")).unwrap(), b"ABC123");
    }

    #[test]
    fn test_objects_are_sorted() {
        let bytes = canonical_bytes(&json!({ "b": 1, "a": [true, null] })).unwrap();
        assert_eq!(bytes, br#"{"a":[true,null],"b":1}"#);
    }

    #[test]
    fn test_revive() {
        assert_eq!(revive(br#"{"challenge":"XYZ"}"#), json!({ "challenge": "XYZ" }));
        assert_eq!(revive(b"ABC123"), json!("ABC123"));
        assert_eq!(revive(b""), json!(""));
        // Numeric text revives as a number, matching JSON.parse
        assert_eq!(revive(b"42"), json!(42));
    }
}
