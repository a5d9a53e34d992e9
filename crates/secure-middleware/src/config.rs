//! Server-side session configuration

use crypto_session::{Keypair, PublicKey, SecretKey};

use crate::{MiddlewareError, MiddlewareResult};

/// Environment variable holding the server secret (64 hex chars)
pub const SECRET_KEY_VAR: &str = "CRYPTO_SESSION_KEY";

/// Environment variable overriding the canonical host
pub const HOST_VAR: &str = "CRYPTO_SESSION_HOST";

pub const DEFAULT_HOST: &str = "http://localhost:3001";

/// Maximum encrypted request envelope size
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Secure session configuration.
///
/// `host` is the scheme and authority GET signatures are checked against.
/// It comes from configuration, never from the request's Host header.
#[derive(Debug, Clone)]
pub struct SecureSessionConfig {
    pub secret: SecretKey,
    pub host: String,
    pub body_limit: usize,
}

impl SecureSessionConfig {
    pub fn new(secret: SecretKey, host: impl Into<String>) -> Self {
        let host = host.into().trim_end_matches('/').to_string();
        Self {
            secret,
            host,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    /// Public key clients must target
    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    /// Load from `CRYPTO_SESSION_KEY` and `CRYPTO_SESSION_HOST`
    pub fn from_env() -> MiddlewareResult<Self> {
        Self::from_vars(
            std::env::var(SECRET_KEY_VAR).ok(),
            std::env::var(HOST_VAR).ok(),
        )
    }

    /// Build from raw variable values
    pub fn from_vars(secret_hex: Option<String>, host: Option<String>) -> MiddlewareResult<Self> {
        let Some(secret_hex) = secret_hex.filter(|s| !s.trim().is_empty()) else {
            let suggestion = Keypair::generate();
            return Err(MiddlewareError::Config(format!(
                "environment variable {SECRET_KEY_VAR} is undefined! \
                 Here is a random key-pair in case you need one: \
                 private key {} public key {}",
                suggestion.secret.to_hex().as_str(),
                suggestion.public,
            )));
        };

        let secret = SecretKey::from_hex(&secret_hex)
            .map_err(|e| MiddlewareError::Config(format!("{SECRET_KEY_VAR}: {e}")))?;

        Ok(Self::new(secret, host.unwrap_or_else(|| DEFAULT_HOST.to_string())))
    }
}
