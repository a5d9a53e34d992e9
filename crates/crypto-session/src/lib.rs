//! Crypto Session - authenticated, encrypted request/response payloads
//!
//! Static secp256k1 Diffie-Hellman between two known public keys, ECDSA
//! signatures over the plaintext and XChaCha20Poly1305 for confidentiality.
//! No handshake: each side derives the shared key from its own secret and
//! the other side's public key.

mod error;
mod keys;
mod payload;
mod session;
mod token;

pub use error::*;
pub use keys::*;
pub use payload::{canonical_bytes, revive, to_payload};
pub use session::*;
pub use token::*;

pub use shared_protocol::{PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, SIGNATURE_SIZE, TOKEN_SIZE};

/// Nonce size for XChaCha20Poly1305 (192 bits / 24 bytes)
pub const NONCE_SIZE: usize = 24;

/// Authentication tag size (128 bits / 16 bytes)
pub const TAG_SIZE: usize = 16;

/// Derived symmetric key size (256 bits / 32 bytes)
pub const SHARED_SECRET_SIZE: usize = 32;
