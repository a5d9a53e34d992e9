//! Fetch error types

use crypto_session::SessionError;
use http::StatusCode;
use shared_protocol::ProtocolError;
use thiserror::Error;

/// Failure of the call itself: nothing usable came back
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Why a received response could not be authenticated.
///
/// Carried on [`crate::SecureResponse::err`] rather than returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    #[error("Failed request: {0}")]
    Status(StatusCode),

    #[error("Response is missing the authorization token")]
    MissingToken,

    #[error("Malformed response: {0}")]
    Format(String),

    #[error("Invalid signature!")]
    InvalidSignature,
}
