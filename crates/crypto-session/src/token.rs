//! Compact `(public key || signature)` authorization token

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use shared_protocol::{PUBLIC_KEY_SIZE, SIGNATURE_SIZE, TOKEN_SIZE};

use crate::{PublicKey, PublicKeyBytes, SessionError, SessionResult};

/// Compact signature bytes
pub type SignatureBytes = [u8; SIGNATURE_SIZE];

/// Sender public key plus the signature over one payload.
///
/// Wire form: `base64url(public_key[33] || signature[64])`, no padding.
/// The bytes are carried as-is; whether the key is a valid curve point is
/// only checked when the token is used for verification.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token {
    public_key: PublicKeyBytes,
    signature: SignatureBytes,
}

impl Token {
    pub fn new(public_key: PublicKeyBytes, signature: SignatureBytes) -> Self {
        Self {
            public_key,
            signature,
        }
    }

    /// Build from slices, rejecting wrong lengths
    pub fn from_slices(public_key: &[u8], signature: &[u8]) -> SessionResult<Self> {
        let public_key: PublicKeyBytes =
            public_key
                .try_into()
                .map_err(|_| SessionError::InvalidLength {
                    what: "token public key",
                    expected: PUBLIC_KEY_SIZE,
                    actual: public_key.len(),
                })?;
        let signature: SignatureBytes =
            signature
                .try_into()
                .map_err(|_| SessionError::InvalidLength {
                    what: "token signature",
                    expected: SIGNATURE_SIZE,
                    actual: signature.len(),
                })?;
        Ok(Self::new(public_key, signature))
    }

    /// Split an encoded token into its key and signature
    pub fn parse(encoded: &str) -> SessionResult<(PublicKeyBytes, SignatureBytes)> {
        if encoded.is_empty() || !is_base64url(encoded) {
            return Err(SessionError::Format(
                "token must be in base64url format".to_string(),
            ));
        }
        let decoded = URL_SAFE_NO_PAD.decode(encoded)?;
        if decoded.len() != TOKEN_SIZE {
            return Err(SessionError::InvalidLength {
                what: "token",
                expected: TOKEN_SIZE,
                actual: decoded.len(),
            });
        }
        let token = Self::from_slices(&decoded[..PUBLIC_KEY_SIZE], &decoded[PUBLIC_KEY_SIZE..])?;
        Ok((token.public_key, token.signature))
    }

    /// Decode a token from its wire form
    pub fn import(encoded: &str) -> SessionResult<Self> {
        let (public_key, signature) = Self::parse(encoded)?;
        Ok(Self::new(public_key, signature))
    }

    /// Non-failing well-formedness check
    pub fn check(encoded: Option<&str>) -> bool {
        encoded.is_some_and(|e| Self::parse(e).is_ok())
    }

    /// Wire form
    pub fn encoded(&self) -> String {
        let mut raw = [0u8; TOKEN_SIZE];
        raw[..PUBLIC_KEY_SIZE].copy_from_slice(&self.public_key);
        raw[PUBLIC_KEY_SIZE..].copy_from_slice(&self.signature);
        URL_SAFE_NO_PAD.encode(raw)
    }

    pub fn public_key(&self) -> &PublicKeyBytes {
        &self.public_key
    }

    pub fn signature(&self) -> &SignatureBytes {
        &self.signature
    }

    pub fn public_hex(&self) -> String {
        hex::encode(self.public_key)
    }

    /// Parse the embedded key as a curve point
    pub fn peer_key(&self) -> SessionResult<PublicKey> {
        PublicKey::from_bytes(&self.public_key)
    }

    /// Whether this token was issued by the given hex identity
    pub fn issued_by(&self, key_hex: &str) -> bool {
        key_hex.eq_ignore_ascii_case(&self.public_hex())
    }
}

fn is_base64url(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("public_key", &self.public_hex())
            .field("signature", &hex::encode(self.signature))
            .finish()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded())
    }
}

impl FromStr for Token {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::import(s)
    }
}

/// Anything that can be turned into a token: a parsed `Token` or its
/// encoded string form.
pub trait IntoToken {
    fn into_token(self) -> SessionResult<Token>;
}

impl IntoToken for Token {
    fn into_token(self) -> SessionResult<Token> {
        Ok(self)
    }
}

impl IntoToken for &Token {
    fn into_token(self) -> SessionResult<Token> {
        Ok(self.clone())
    }
}

impl IntoToken for &str {
    fn into_token(self) -> SessionResult<Token> {
        Token::import(self)
    }
}

impl IntoToken for &String {
    fn into_token(self) -> SessionResult<Token> {
        Token::import(self)
    }
}

impl IntoToken for String {
    fn into_token(self) -> SessionResult<Token> {
        Token::import(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Token {
        let mut public_key = [0u8; PUBLIC_KEY_SIZE];
        public_key[0] = 0x02;
        public_key[1..].fill(0xAB);
        Token::new(public_key, [0x5A; SIGNATURE_SIZE])
    }

    #[test]
    fn test_encoded_is_url_safe() {
        let encoded = sample().encoded();
        // 97 bytes -> 130 chars without padding
        assert_eq!(encoded.len(), 130);
        assert!(is_base64url(&encoded));
        assert!(!encoded.contains('='));
    }

    #[test]
    fn test_import_rejects_wrong_length() {
        let short = URL_SAFE_NO_PAD.encode([1u8; 96]);
        let err = Token::import(&short).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidLength {
                expected: 97,
                actual: 96,
                ..
            }
        ));
        assert!(err.is_format());
    }

    #[test]
    fn test_import_rejects_bad_alphabet() {
        let mut encoded = sample().encoded();
        encoded.replace_range(0..1, "+");
        assert!(matches!(Token::import(&encoded), Err(SessionError::Format(_))));
        assert!(Token::import("").is_err());
    }

    #[test]
    fn test_check() {
        assert!(Token::check(Some(&sample().encoded())));
        assert!(!Token::check(Some("not a token")));
        assert!(!Token::check(None));
    }

    #[test]
    fn test_issued_by_ignores_case() {
        let token = sample();
        assert!(token.issued_by(&token.public_hex().to_uppercase()));
        assert!(!token.issued_by("02ab"));
    }

    #[test]
    fn test_string_forms_into_token() {
        let token = sample();
        let encoded = token.encoded();
        assert_eq!(encoded.as_str().into_token().unwrap(), token);
        assert_eq!((&encoded).into_token().unwrap(), token);
        assert_eq!(encoded.parse::<Token>().unwrap(), token);
    }

    proptest! {
        #[test]
        fn prop_token_roundtrip(
            public_key in prop::array::uniform32(any::<u8>()),
            first in any::<u8>(),
            sig_a in prop::array::uniform32(any::<u8>()),
            sig_b in prop::array::uniform32(any::<u8>()),
        ) {
            let mut pk = [0u8; PUBLIC_KEY_SIZE];
            pk[0] = first;
            pk[1..].copy_from_slice(&public_key);
            let mut sig = [0u8; SIGNATURE_SIZE];
            sig[..32].copy_from_slice(&sig_a);
            sig[32..].copy_from_slice(&sig_b);

            let imported = Token::import(&Token::new(pk, sig).encoded()).unwrap();
            prop_assert_eq!(imported.public_key(), &pk);
            prop_assert_eq!(imported.signature(), &sig);
        }

        #[test]
        fn prop_wrong_length_rejected(bytes in prop::collection::vec(any::<u8>(), 0..200)) {
            prop_assume!(bytes.len() != TOKEN_SIZE);
            let encoded = URL_SAFE_NO_PAD.encode(&bytes);
            prop_assert!(Token::import(&encoded).is_err());
        }
    }
}
