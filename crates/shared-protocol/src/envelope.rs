//! Request body envelope for encrypted POST requests

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, ProtocolResult};

/// JSON body sent by the client in place of the original POST body.
///
/// The minimal form is `{ "data": "<base64url ciphertext>" }`. Older
/// clients also send `isEncoded` and a `type` hint; when `isEncoded` is
/// present and false the `data` field is plaintext and carries no
/// authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEnvelope {
    /// Base64url ciphertext, or plaintext when `is_encoded == Some(false)`
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_encoded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl PostEnvelope {
    /// Wrap a base64url ciphertext
    pub fn encoded(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            is_encoded: None,
            padding: None,
            kind: None,
        }
    }

    /// Whether `data` should be treated as ciphertext
    pub fn is_encoded(&self) -> bool {
        self.is_encoded.unwrap_or(true)
    }

    /// Ciphertext carried by the envelope, rejecting plaintext envelopes
    pub fn ciphertext(&self) -> ProtocolResult<&str> {
        if self.is_encoded() {
            Ok(&self.data)
        } else {
            Err(ProtocolError::NotEncoded)
        }
    }

    /// Serialize to the JSON request body
    pub fn to_json(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from a JSON request body
    pub fn from_json(body: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_envelope() {
        let env = PostEnvelope::encoded("abc_-");
        assert_eq!(env.to_json().unwrap(), r#"{"data":"abc_-"}"#);
        assert_eq!(env.ciphertext().unwrap(), "abc_-");
    }

    #[test]
    fn test_plaintext_envelope_is_rejected() {
        let env = PostEnvelope::from_json(br#"{"isEncoded":false,"data":"hello","type":"text"}"#)
            .unwrap();
        assert!(!env.is_encoded());
        assert_eq!(env.kind.as_deref(), Some("text"));
        assert!(matches!(env.ciphertext(), Err(ProtocolError::NotEncoded)));
    }

    #[test]
    fn test_missing_data_fails() {
        assert!(PostEnvelope::from_json(br#"{"padding":"xx"}"#).is_err());
    }
}
