//! Outgoing request description

use std::collections::HashMap;

use crypto_session::{SessionResult, canonical_bytes};
use http::Method;
use serde_json::Value;

/// Body of an outgoing request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Sent exactly as given
    Text(String),
    /// Serialized canonically before signing
    Json(Value),
}

impl RequestBody {
    /// The bytes that get signed and encrypted
    pub fn canonical(&self) -> SessionResult<Vec<u8>> {
        match self {
            Self::Empty => Ok(Vec::new()),
            Self::Text(text) => Ok(text.as_bytes().to_vec()),
            Self::Json(value) => canonical_bytes(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            other => Self::Json(other),
        }
    }
}

impl<T: Into<RequestBody>> From<Option<T>> for RequestBody {
    fn from(body: Option<T>) -> Self {
        body.map(Into::into).unwrap_or_default()
    }
}

/// A request handed to [`crate::SecureFetch::execute`]
#[derive(Debug, Clone)]
pub struct SecureRequest {
    pub method: Method,
    /// Absolute URL, or a path appended to the configured hostname
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: RequestBody,
}

impl SecureRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: impl Into<RequestBody>) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

impl From<&str> for SecureRequest {
    fn from(path: &str) -> Self {
        Self::get(path)
    }
}

impl From<String> for SecureRequest {
    fn from(path: String) -> Self {
        Self::get(path)
    }
}

impl From<http::Request<String>> for SecureRequest {
    fn from(request: http::Request<String>) -> Self {
        let (parts, body) = request.into_parts();
        let headers = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = if body.is_empty() {
            RequestBody::Empty
        } else {
            RequestBody::Text(body)
        };

        Self {
            method: parts.method,
            path: parts.uri.to_string(),
            headers,
            body,
        }
    }
}
