//! Shared Protocol Definitions for Crypto Session
//!
//! Wire-level constants, the POST envelope and the header carrier
//! capability shared by the fetch client and the server middleware.

mod envelope;
mod error;
mod headers;

pub use envelope::*;
pub use error::*;
pub use headers::*;

/// Compressed secp256k1 public key size
pub const PUBLIC_KEY_SIZE: usize = 33;

/// Compact ECDSA signature size (r || s)
pub const SIGNATURE_SIZE: usize = 64;

/// Raw token size before base64url encoding
pub const TOKEN_SIZE: usize = PUBLIC_KEY_SIZE + SIGNATURE_SIZE;

/// Private key size
pub const SECRET_KEY_SIZE: usize = 32;

/// Header carrying the encoded token on requests and responses
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Header naming the body media type
pub const CONTENT_TYPE_HEADER: &str = "content-type";

pub const JSON_CONTENT_TYPE: &str = "application/json";

pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Content type of an encrypted request envelope
pub const ENVELOPE_CONTENT_TYPE: &str = JSON_CONTENT_TYPE;

/// Content type of an encrypted response body
pub const CIPHERTEXT_CONTENT_TYPE: &str = "text/plain";
