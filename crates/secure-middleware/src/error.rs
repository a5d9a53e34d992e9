//! Middleware error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crypto_session::SessionError;
use shared_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MiddlewareError {
    #[error("Request is not authenticated")]
    Unauthenticated,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Failed to read request body: {0}")]
    Body(String),

    #[error("Secure session missing from request")]
    MissingContext,

    #[error("Failed to encode response: {0}")]
    Encode(SessionError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type MiddlewareResult<T> = Result<T, MiddlewareError>;

impl IntoResponse for MiddlewareError {
    /// Bare status, never any detail
    fn into_response(self) -> Response {
        let status = match self {
            Self::Encode(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        };
        status.into_response()
    }
}
