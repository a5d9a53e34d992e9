//! Header access shared by client and server header representations

use std::collections::HashMap;

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::{ProtocolError, ProtocolResult};

/// Get/set access to named headers.
///
/// Implemented for `http::HeaderMap` (server side and the HTTP client
/// response) and for a plain `HashMap<String, String>` (transport-agnostic
/// outbound requests). Lookups are case-insensitive for both.
pub trait HeaderCarrier {
    /// Read a header value as text
    fn header(&self, name: &str) -> Option<&str>;

    /// Insert or replace a header value
    fn set_header(&mut self, name: &'static str, value: &str) -> ProtocolResult<()>;

    /// Read a header that must be present
    fn require_header(&self, name: &'static str) -> ProtocolResult<&str> {
        self.header(name).ok_or(ProtocolError::MissingHeader(name))
    }
}

impl HeaderCarrier for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    fn set_header(&mut self, name: &'static str, value: &str) -> ProtocolResult<()> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| ProtocolError::InvalidHeader(name))?;
        let value = HeaderValue::from_str(value).map_err(|_| ProtocolError::InvalidHeader(name))?;
        self.insert(header_name, value);
        Ok(())
    }
}

impl HeaderCarrier for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn set_header(&mut self, name: &'static str, value: &str) -> ProtocolResult<()> {
        self.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.insert(name.to_string(), value.to_string());
        Ok(())
    }
}
