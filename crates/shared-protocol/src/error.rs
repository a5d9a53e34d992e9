//! Error types for the protocol

use thiserror::Error;

/// Protocol error
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    #[error("Invalid header name or value for {0}")]
    InvalidHeader(&'static str),

    #[error("Envelope is not encoded")]
    NotEncoded,
}

/// Result type alias for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
