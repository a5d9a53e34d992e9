//! Static-static secp256k1 session: ECDSA signatures + XChaCha20Poly1305

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use hkdf::Hkdf;
use k256::ecdsa::{
    Signature, SigningKey, VerifyingKey,
    signature::hazmat::{PrehashSigner, PrehashVerifier},
};
use rand::{RngCore, rngs::OsRng};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::payload::{canonical_bytes, revive, to_payload};
use crate::{
    IntoToken, NONCE_SIZE, PublicKey, SHARED_SECRET_SIZE, SecretKey, SessionError, SessionResult,
    SignatureBytes, TAG_SIZE, Token,
};

/// HKDF info string binding derived keys to this protocol
const KDF_INFO: &[u8] = b"crypto-session/v1/shared-key";

/// Derive the symmetric key shared between `secret` and `peer`.
///
/// `derive_shared_secret(a, B) == derive_shared_secret(b, A)` for any two
/// keypairs: the ECDH x-coordinate is expanded with HKDF-SHA256.
pub fn derive_shared_secret(
    secret: &SecretKey,
    peer: &PublicKey,
) -> SessionResult<Zeroizing<[u8; SHARED_SECRET_SIZE]>> {
    let shared = k256::ecdh::diffie_hellman(
        secret.inner().to_nonzero_scalar(),
        peer.inner().as_affine(),
    );

    let hkdf = Hkdf::<Sha256>::new(None, shared.raw_secret_bytes());
    let mut key = Zeroizing::new([0u8; SHARED_SECRET_SIZE]);
    hkdf.expand(KDF_INFO, &mut key[..])
        .map_err(|e| SessionError::KeyDerivation(e.to_string()))?;

    Ok(key)
}

/// Output of [`CryptoSession::encode`]
#[derive(Debug, Clone)]
pub struct EncodedData {
    /// Sender key and signature over the plaintext
    pub token: Token,
    /// Base64url of `nonce || ciphertext || tag`
    pub data: String,
}

/// Output of [`CryptoSession::decode`]
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedData {
    /// Revived plaintext; `Null` when the ciphertext failed authentication
    pub payload: Value,
    /// Whether the token's signature matched the plaintext and the peer
    pub is_valid: bool,
}

/// One party's secret paired with one counterparty's public key.
///
/// Immutable after construction. Create one per counterparty; nothing is
/// cached between calls so a session can be shared freely across tasks.
#[derive(Debug, Clone)]
pub struct CryptoSession {
    secret: SecretKey,
    peer_key: PublicKey,
}

impl CryptoSession {
    pub fn new(peer_key: PublicKey, secret: SecretKey) -> Self {
        Self { secret, peer_key }
    }

    /// Build from hex encoded keys
    pub fn from_hex(peer_hex: &str, secret_hex: &str) -> SessionResult<Self> {
        Ok(Self::new(
            PublicKey::from_hex(peer_hex)?,
            SecretKey::from_hex(secret_hex)?,
        ))
    }

    /// Session with a freshly generated secret
    pub fn generate(peer_key: PublicKey) -> Self {
        Self::new(peer_key, SecretKey::generate())
    }

    /// Session whose peer is the key embedded in an encoded token
    pub fn with_token(encoded: &str, secret: SecretKey) -> SessionResult<Self> {
        let token = Token::import(encoded)?;
        Ok(Self::new(token.peer_key()?, secret))
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    pub fn pub_hex(&self) -> String {
        self.public_key().to_hex()
    }

    pub fn peer_key(&self) -> &PublicKey {
        &self.peer_key
    }

    pub fn peer_hex(&self) -> String {
        self.peer_key.to_hex()
    }

    /// Symmetric key shared with the peer
    pub fn shared_secret(&self) -> SessionResult<Zeroizing<[u8; SHARED_SECRET_SIZE]>> {
        derive_shared_secret(&self.secret, &self.peer_key)
    }

    /// SHA-256 of the shared secret, safe to display
    pub fn shared_hash(&self) -> SessionResult<[u8; 32]> {
        Ok(Sha256::digest(&self.shared_secret()?[..]).into())
    }

    pub fn shared_hex(&self) -> SessionResult<String> {
        Ok(hex::encode(self.shared_hash()?))
    }

    /// Sign the SHA-256 digest of `payload`
    pub fn sign(&self, payload: &[u8]) -> SessionResult<SignatureBytes> {
        let digest = Sha256::digest(payload);
        let signing_key = SigningKey::from(self.secret.inner());
        let signature: Signature = signing_key
            .sign_prehash(&digest)
            .map_err(|e| SessionError::Signing(e.to_string()))?;

        let mut out = [0u8; 64];
        out.copy_from_slice(&signature.to_bytes());
        Ok(out)
    }

    /// Token authenticating `payload` without encrypting it
    pub fn sign_token(&self, payload: &[u8]) -> SessionResult<Token> {
        Ok(Token::new(self.public_key().to_bytes(), self.sign(payload)?))
    }

    /// Check a token's signature over `payload`.
    ///
    /// Returns `Ok(false)` when the token was issued by anyone other than
    /// this session's peer, or when the signature does not match. Fails
    /// only for a malformed encoded token.
    pub fn verify(&self, token: impl IntoToken, payload: &[u8]) -> SessionResult<bool> {
        let token = token.into_token()?;

        if token.public_key() != &self.peer_key.to_bytes() {
            warn!(
                issuer = %token.public_hex(),
                peer = %self.peer_hex(),
                "Token issued by unexpected key"
            );
            return Ok(false);
        }

        let valid = verify_signature(&token, payload);
        if !valid {
            warn!(peer = %self.peer_hex(), "Signature failed to validate");
        }
        Ok(valid)
    }

    /// Encrypt for the peer.
    ///
    /// Returns: `[24-byte nonce][ciphertext][16-byte tag]`
    pub fn encrypt(&self, plaintext: &[u8]) -> SessionResult<Vec<u8>> {
        let key = self.shared_secret()?;
        let cipher = XChaCha20Poly1305::new_from_slice(&key[..])
            .map_err(|e| SessionError::Encryption(e.to_string()))?;

        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|e| SessionError::Encryption(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt data sent by the peer
    pub fn decrypt(&self, data: &[u8]) -> SessionResult<Vec<u8>> {
        self.decrypt_from(&self.peer_key, data)
    }

    fn decrypt_from(&self, sender: &PublicKey, data: &[u8]) -> SessionResult<Vec<u8>> {
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(SessionError::Format(format!(
                "ciphertext too short: {} bytes",
                data.len()
            )));
        }

        let key = derive_shared_secret(&self.secret, sender)?;
        let cipher = XChaCha20Poly1305::new_from_slice(&key[..])
            .map_err(|e| SessionError::KeyDerivation(e.to_string()))?;

        let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
        cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| SessionError::DecryptionFailed)
    }

    /// Sign then encrypt a payload.
    ///
    /// Strings are sent as their bytes; other JSON values are serialized
    /// first. The signature covers the plaintext bytes.
    pub fn encode(&self, payload: &Value) -> SessionResult<EncodedData> {
        self.encode_bytes(&canonical_bytes(payload)?)
    }

    /// Encode any serializable value
    pub fn encode_json<T: Serialize + ?Sized>(&self, payload: &T) -> SessionResult<EncodedData> {
        self.encode(&to_payload(payload)?)
    }

    /// Encode raw bytes
    pub fn encode_bytes(&self, raw: &[u8]) -> SessionResult<EncodedData> {
        let token = self.sign_token(raw)?;
        let encrypted = self.encrypt(raw)?;

        debug!(peer = %self.peer_hex(), bytes = raw.len(), "Encoded payload");

        Ok(EncodedData {
            token,
            data: URL_SAFE_NO_PAD.encode(encrypted),
        })
    }

    /// Decrypt then verify.
    ///
    /// Malformed base64url, a token key that is not a curve point, or a
    /// ciphertext too short to hold nonce and tag are errors. A ciphertext
    /// that fails authentication, or a signature that does not match,
    /// yields `is_valid == false`.
    pub fn decode(&self, token: impl IntoToken, ciphertext: &str) -> SessionResult<DecodedData> {
        let token = token.into_token()?;
        let encrypted = decode_base64url(ciphertext)?;
        let sender = token.peer_key()?;

        let plaintext = match self.decrypt_from(&sender, &encrypted) {
            Ok(plaintext) => plaintext,
            Err(SessionError::DecryptionFailed) => {
                warn!(issuer = %token.public_hex(), "Ciphertext failed authentication");
                return Ok(DecodedData {
                    payload: Value::Null,
                    is_valid: false,
                });
            }
            Err(e) => return Err(e),
        };

        let is_valid = self.verify(&token, &plaintext)?;
        debug!(peer = %self.peer_hex(), bytes = plaintext.len(), is_valid, "Decoded payload");

        Ok(DecodedData {
            payload: revive(&plaintext),
            is_valid,
        })
    }
}

fn verify_signature(token: &Token, payload: &[u8]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(token.public_key()) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(token.signature()) else {
        return false;
    };
    let digest = Sha256::digest(payload);
    verifying_key.verify_prehash(&digest, &signature).is_ok()
}

fn decode_base64url(encoded: &str) -> SessionResult<Vec<u8>> {
    let valid_alphabet = encoded
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if encoded.is_empty() || !valid_alphabet {
        return Err(SessionError::Format(
            "encoded data must be in base64url format".to_string(),
        ));
    }
    Ok(URL_SAFE_NO_PAD.decode(encoded)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keypair;
    use proptest::prelude::*;
    use serde_json::json;

    fn pair() -> (Keypair, Keypair, CryptoSession, CryptoSession) {
        let client = Keypair::generate();
        let server = Keypair::generate();
        let client_session = CryptoSession::new(server.public.clone(), client.secret.clone());
        let server_session = CryptoSession::new(client.public.clone(), server.secret.clone());
        (client, server, client_session, server_session)
    }

    #[test]
    fn test_encode_decode_json() {
        let (_, _, client, server) = pair();
        let payload = json!({ "client": "ping!" });

        let EncodedData { token, data } = client.encode(&payload).unwrap();
        let decoded = server.decode(&token, &data).unwrap();

        assert!(decoded.is_valid);
        assert_eq!(decoded.payload, payload);
    }

    #[test]
    fn test_encode_decode_reverse_direction() {
        let (_, _, client, server) = pair();
        let reply = server.encode(&json!("ABC123")).unwrap();
        let decoded = client.decode(reply.token.encoded(), &reply.data).unwrap();

        assert!(decoded.is_valid);
        assert_eq!(decoded.payload, json!("ABC123"));
    }

    #[test]
    fn test_encode_json_struct() {
        #[derive(Serialize)]
        struct Challenge<'a> {
            challenge: &'a str,
        }

        let (_, _, client, server) = pair();
        let encoded = client.encode_json(&Challenge { challenge: "XYZ" }).unwrap();
        let decoded = server.decode(&encoded.token, &encoded.data).unwrap();
        assert_eq!(decoded.payload, json!({ "challenge": "XYZ" }));
    }

    #[test]
    fn test_shared_secret_symmetry() {
        let (_, _, client, server) = pair();
        assert_eq!(*client.shared_secret().unwrap(), *server.shared_secret().unwrap());
        assert_eq!(client.shared_hex().unwrap(), server.shared_hex().unwrap());
    }

    #[test]
    fn test_ciphertext_tamper_is_invalid() {
        let (_, _, client, server) = pair();
        let encoded = client.encode(&json!({ "a": 1 })).unwrap();

        let mut raw = URL_SAFE_NO_PAD.decode(&encoded.data).unwrap();
        for i in 0..raw.len() {
            raw[i] ^= 0x01;
            let tampered = URL_SAFE_NO_PAD.encode(&raw);
            let decoded = server.decode(&encoded.token, &tampered).unwrap();
            assert!(!decoded.is_valid, "byte {i} flip accepted");
            raw[i] ^= 0x01;
        }
    }

    #[test]
    fn test_substituted_signature_is_invalid() {
        let (_, _, client, server) = pair();
        let first = client.encode(&json!("first")).unwrap();
        let second = client.encode(&json!("second")).unwrap();

        let forged = Token::new(*first.token.public_key(), *second.token.signature());
        let decoded = server.decode(&forged, &first.data).unwrap();

        assert!(!decoded.is_valid);
        assert_eq!(decoded.payload, json!("first"));
    }

    #[test]
    fn test_verify_rejects_wrong_peer() {
        let (_, server_keys, _, server) = pair();
        let intruder = CryptoSession::new(server_keys.public.clone(), SecretKey::generate());

        // Cryptographically valid for the intruder's key, but not the expected peer
        let token = intruder.sign_token(b"http://host/path").unwrap();
        assert!(!server.verify(&token, b"http://host/path").unwrap());
    }

    #[test]
    fn test_decode_rejects_wrong_peer() {
        let (_, server_keys, _, server) = pair();
        let intruder = CryptoSession::new(server_keys.public.clone(), SecretKey::generate());

        let encoded = intruder.encode(&json!("hello")).unwrap();
        let decoded = server.decode(&encoded.token, &encoded.data).unwrap();
        assert!(!decoded.is_valid);
    }

    #[test]
    fn test_verify_accepts_token_string() {
        let (_, _, client, server) = pair();
        let token = client.sign_token(b"http://host/getSend?challenge=ABC123").unwrap();

        assert!(server
            .verify(token.encoded(), b"http://host/getSend?challenge=ABC123")
            .unwrap());
        assert!(!server
            .verify(&token, b"http://evil/getSend?challenge=ABC123")
            .unwrap());
        assert!(server.verify("%%%", b"anything").unwrap_err().is_format());
    }

    #[test]
    fn test_decode_format_errors() {
        let (_, _, client, server) = pair();
        let encoded = client.encode(&json!("x")).unwrap();

        let err = server.decode(&encoded.token, "not/base64+").unwrap_err();
        assert!(err.is_format());

        let err = server.decode(&encoded.token, "").unwrap_err();
        assert!(err.is_format());

        let short = URL_SAFE_NO_PAD.encode([0u8; 10]);
        let err = server.decode(&encoded.token, &short).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_decode_rejects_token_with_invalid_point() {
        let (_, _, client, server) = pair();
        let encoded = client.encode(&json!("x")).unwrap();
        let bogus = Token::new([0xFF; 33], *encoded.token.signature());

        let err = server.decode(&bogus, &encoded.data).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPublicKey(_)));
    }

    #[test]
    fn test_with_token_uses_embedded_key() {
        let (client_keys, server_keys, client, _) = pair();
        let token = client.sign_token(b"hello").unwrap();

        let server = CryptoSession::with_token(&token.encoded(), server_keys.secret.clone()).unwrap();
        assert_eq!(server.peer_key(), &client_keys.public);
        assert!(server.verify(&token, b"hello").unwrap());
    }

    #[test]
    fn test_nonces_differ_per_encode() {
        let (_, _, client, _) = pair();
        let a = client.encode(&json!("same")).unwrap();
        let b = client.encode(&json!("same")).unwrap();
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn test_json_looking_text_revives_as_json() {
        // Strings travel as raw bytes, so text that parses as JSON comes back as JSON.
        // The text property below prefixes its input to stay clear of this case.
        let (_, _, client, server) = pair();
        for (sent, revived) in [
            (json!("123"), json!(123)),
            (json!("true"), json!(true)),
            (json!("null"), Value::Null),
            (json!(r#"{"a":1}"#), json!({ "a": 1 })),
        ] {
            let encoded = client.encode(&sent).unwrap();
            let decoded = server.decode(&encoded.token, &encoded.data).unwrap();
            assert!(decoded.is_valid);
            assert_eq!(decoded.payload, revived);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_shared_secret_symmetric(_seed in any::<u64>()) {
            let a = Keypair::generate();
            let b = Keypair::generate();
            let ab = derive_shared_secret(&a.secret, &b.public).unwrap();
            let ba = derive_shared_secret(&b.secret, &a.public).unwrap();
            prop_assert_eq!(*ab, *ba);
        }

        #[test]
        fn prop_roundtrip_text(text in "[a-zA-Z0-9 ]{0,64}") {
            let (_, _, client, server) = pair();
            let payload = Value::String(format!("msg:{text}"));
            let encoded = client.encode(&payload).unwrap();
            let decoded = server.decode(&encoded.token, &encoded.data).unwrap();
            prop_assert!(decoded.is_valid);
            prop_assert_eq!(decoded.payload, payload);
        }

        #[test]
        fn prop_roundtrip_object(name in "[a-z]{1,12}", num in any::<i64>(), flag in any::<bool>()) {
            let (_, _, client, server) = pair();
            let payload = json!({ "name": name, "inner": { "n": num, "flag": flag, "list": [num, null] } });
            let encoded = client.encode(&payload).unwrap();
            let decoded = server.decode(&encoded.token, &encoded.data).unwrap();
            prop_assert!(decoded.is_valid);
            prop_assert_eq!(decoded.payload, payload);
        }
    }
}
