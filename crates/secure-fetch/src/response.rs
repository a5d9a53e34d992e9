//! Response returned to callers

use crypto_session::Token;
use http::{HeaderMap, StatusCode};
use serde_json::Value;

use crate::{RawResponse, ResponseError};

/// Outcome of a secure call.
///
/// Check `err` before using `data`: authentication failures and non-OK
/// statuses are reported here rather than as an `Err` from `execute`.
#[derive(Debug, Clone)]
pub struct SecureResponse {
    pub status: StatusCode,
    pub url: String,
    pub headers: HeaderMap,
    /// Raw response body text
    pub body: String,
    /// Reply token, once verified
    pub token: Option<Token>,
    /// Decrypted payload, present only when the reply authenticated
    pub data: Option<Value>,
    pub err: Option<ResponseError>,
}

impl SecureResponse {
    pub(crate) fn from_raw(raw: RawResponse) -> Self {
        Self {
            status: raw.status,
            url: raw.url,
            headers: raw.headers,
            body: raw.body,
            token: None,
            data: None,
            err: None,
        }
    }

    /// HTTP status in the 2xx range
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// Decrypted payload as text, when it is a string
    pub fn text(&self) -> Option<&str> {
        self.data.as_ref().and_then(Value::as_str)
    }
}
