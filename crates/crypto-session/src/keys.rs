//! secp256k1 key material

use std::fmt;
use std::str::FromStr;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use shared_protocol::{PUBLIC_KEY_SIZE, SECRET_KEY_SIZE};
use zeroize::Zeroizing;

use crate::{SessionError, SessionResult};

/// Compressed public key bytes
pub type PublicKeyBytes = [u8; PUBLIC_KEY_SIZE];

/// A party's private key. Zeroized on drop.
#[derive(Clone)]
pub struct SecretKey(k256::SecretKey);

impl SecretKey {
    /// Generate a fresh random key
    pub fn generate() -> Self {
        Self(k256::SecretKey::random(&mut OsRng))
    }

    /// Import from exactly 32 raw bytes
    pub fn from_bytes(bytes: &[u8]) -> SessionResult<Self> {
        if bytes.len() != SECRET_KEY_SIZE {
            return Err(SessionError::InvalidLength {
                what: "secret key",
                expected: SECRET_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        k256::SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| SessionError::InvalidSecretKey(e.to_string()))
    }

    /// Import from a 64 character hex string
    pub fn from_hex(hex_str: &str) -> SessionResult<Self> {
        let trimmed = hex_str.trim();
        if trimmed.len() != SECRET_KEY_SIZE * 2 {
            return Err(SessionError::InvalidSecretKey(
                "must be 32 bytes in hex string format".to_string(),
            ));
        }
        let bytes = Zeroizing::new(hex::decode(trimmed)?);
        Self::from_bytes(&bytes)
    }

    /// Export as lowercase hex
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0.to_bytes()))
    }

    /// Public key matching this secret
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.public_key())
    }

    pub(crate) fn inner(&self) -> &k256::SecretKey {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretKey").field(&"<redacted>").finish()
    }
}

impl FromStr for SecretKey {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// A party's public key, always a valid curve point
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(k256::PublicKey);

impl PublicKey {
    /// Import from SEC1 bytes (33 byte compressed or 65 byte uncompressed)
    pub fn from_bytes(bytes: &[u8]) -> SessionResult<Self> {
        k256::PublicKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| SessionError::InvalidPublicKey(format!("{} bytes are not a curve point", bytes.len())))
    }

    /// Import from SEC1 hex
    pub fn from_hex(hex_str: &str) -> SessionResult<Self> {
        Self::from_bytes(&hex::decode(hex_str.trim())?)
    }

    /// Compressed SEC1 encoding
    pub fn to_bytes(&self) -> PublicKeyBytes {
        let point = self.0.to_encoded_point(true);
        let mut out = [0u8; PUBLIC_KEY_SIZE];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Compressed SEC1 encoding as lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub(crate) fn inner(&self) -> &k256::PublicKey {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Secret plus its public key
#[derive(Debug, Clone)]
pub struct Keypair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl Keypair {
    /// Generate a random keypair
    pub fn generate() -> Self {
        Self::from_secret(SecretKey::generate())
    }

    pub fn from_secret(secret: SecretKey) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_hex_roundtrip() {
        let keys = Keypair::generate();
        let restored = SecretKey::from_hex(&keys.secret.to_hex()).unwrap();
        assert_eq!(restored.public_key(), keys.public);
    }

    #[test]
    fn test_secret_hex_wrong_length() {
        let err = SecretKey::from_hex("abcd").unwrap_err();
        assert!(err.to_string().contains("32 bytes"));
    }

    #[test]
    fn test_zero_secret_rejected() {
        assert!(matches!(
            SecretKey::from_bytes(&[0u8; 32]),
            Err(SessionError::InvalidSecretKey(_))
        ));
    }

    #[test]
    fn test_public_key_is_compressed() {
        let keys = Keypair::generate();
        let bytes = keys.public.to_bytes();
        assert!(bytes[0] == 0x02 || bytes[0] == 0x03);
        assert_eq!(PublicKey::from_bytes(&bytes).unwrap(), keys.public);
    }

    #[test]
    fn test_uncompressed_public_key_accepted() {
        let keys = Keypair::generate();
        let uncompressed = keys.public.inner().to_encoded_point(false);
        let parsed = PublicKey::from_bytes(uncompressed.as_bytes()).unwrap();
        assert_eq!(parsed.to_bytes(), keys.public.to_bytes());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let keys = Keypair::generate();
        let debug = format!("{:?}", keys.secret);
        assert!(!debug.contains(keys.secret.to_hex().as_str()));
    }
}
