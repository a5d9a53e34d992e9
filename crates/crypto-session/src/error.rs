//! Crypto session error types

use shared_protocol::ProtocolError;
use thiserror::Error;

/// Cryptographic session error
///
/// `Format` covers corrupt wire data (bad base64url, wrong lengths, missing
/// headers). An authentic-looking payload whose signature does not check
/// out is not an error; it is reported through `DecodedData::is_valid`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid length for {what}: expected {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: authentication tag mismatch")]
    DecryptionFailed,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl SessionError {
    /// Whether this error describes malformed input rather than a local failure
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Self::Format(_) | Self::InvalidLength { .. } | Self::InvalidPublicKey(_) | Self::Protocol(_)
        )
    }
}

impl From<base64::DecodeError> for SessionError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Format(format!("invalid base64url: {err}"))
    }
}

impl From<hex::FromHexError> for SessionError {
    fn from(err: hex::FromHexError) -> Self {
        Self::Format(format!("invalid hex: {err}"))
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
