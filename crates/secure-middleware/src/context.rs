//! Per-request session state and the secure responder

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use crypto_session::{CryptoSession, EncodedData, Token};
use serde::Serialize;
use shared_protocol::CIPHERTEXT_CONTENT_TYPE;
use tracing::debug;

use crate::{MiddlewareError, MiddlewareResult};

/// Authentication state attached to each request by the middleware
#[derive(Debug, Clone)]
pub struct SecureContext {
    /// Token presented by the caller
    pub token: Token,
    /// Session between the server secret and the caller's key
    pub session: CryptoSession,
    pub is_authenticated: bool,
}

impl SecureContext {
    pub fn responder(&self) -> SecureResponder {
        SecureResponder {
            session: self.session.clone(),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SecureContext {
    type Rejection = MiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecureContext>()
            .cloned()
            .ok_or(MiddlewareError::MissingContext)
    }
}

/// Answers the caller with signed, encrypted responses.
///
/// Every reply goes back under the same shared secret the request was
/// authenticated with: the token travels in `authorization`, the
/// base64url ciphertext is the body.
#[derive(Debug, Clone)]
pub struct SecureResponder {
    session: CryptoSession,
}

impl SecureResponder {
    /// Reply with a text payload
    pub fn send(&self, payload: impl Into<String>) -> MiddlewareResult<Response> {
        let payload = serde_json::Value::String(payload.into());
        let encoded = self
            .session
            .encode(&payload)
            .map_err(MiddlewareError::Encode)?;
        self.respond(encoded)
    }

    /// Reply with a JSON payload
    pub fn json<T: Serialize + ?Sized>(&self, payload: &T) -> MiddlewareResult<Response> {
        let encoded = self
            .session
            .encode_json(payload)
            .map_err(MiddlewareError::Encode)?;
        self.respond(encoded)
    }

    fn respond(&self, encoded: EncodedData) -> MiddlewareResult<Response> {
        let token = HeaderValue::from_str(&encoded.token.encoded())
            .map_err(|e| MiddlewareError::Body(e.to_string()))?;

        debug!(peer = %self.session.peer_hex(), "Sending secured response");

        Ok((
            StatusCode::OK,
            [
                (CONTENT_TYPE, HeaderValue::from_static(CIPHERTEXT_CONTENT_TYPE)),
                (AUTHORIZATION, token),
            ],
            encoded.data,
        )
            .into_response())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SecureResponder {
    type Rejection = MiddlewareError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let context = SecureContext::from_request_parts(parts, state).await?;
        Ok(context.responder())
    }
}
