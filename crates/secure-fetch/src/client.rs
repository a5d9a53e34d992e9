//! Secure fetch client

use std::collections::HashMap;

use crypto_session::{CryptoSession, PublicKey, SecretKey, Token};
use http::Method;
use shared_protocol::{
    AUTHORIZATION_HEADER, CONTENT_TYPE_HEADER, ENVELOPE_CONTENT_TYPE, HeaderCarrier, PostEnvelope,
};
use tracing::{debug, warn};

use crate::{
    FetchError, FetchResult, OutboundRequest, RawResponse, ReqwestTransport, RequestBody, ResponseError,
    SecureRequest, SecureResponse, Transport,
};

/// Client configuration
#[derive(Debug, Clone, Default)]
pub struct SecureFetchOptions {
    /// Prefix prepended to every request path, e.g. `http://localhost:3001`
    pub hostname: String,
    /// Headers sent with every request
    pub headers: HashMap<String, String>,
}

/// HTTP client bound to one server public key.
///
/// GET requests are authenticated by signing the full URL. POST bodies are
/// signed, encrypted and sent as `{ "data": <ciphertext> }`. Other methods
/// pass through without authentication.
pub struct SecureFetch<T: Transport = ReqwestTransport> {
    session: CryptoSession,
    hostname: String,
    headers: HashMap<String, String>,
    transport: T,
}

impl SecureFetch<ReqwestTransport> {
    pub fn new(peer_key: PublicKey, secret: SecretKey, options: SecureFetchOptions) -> Self {
        Self::with_transport(peer_key, secret, options, ReqwestTransport::default())
    }

    /// Client with a freshly generated identity
    pub fn generate(peer_key: PublicKey, options: SecureFetchOptions) -> Self {
        Self::new(peer_key, SecretKey::generate(), options)
    }
}

impl<T: Transport> SecureFetch<T> {
    pub fn with_transport(
        peer_key: PublicKey,
        secret: SecretKey,
        options: SecureFetchOptions,
        transport: T,
    ) -> Self {
        Self {
            session: CryptoSession::new(peer_key, secret),
            hostname: options.hostname,
            headers: options.headers,
            transport,
        }
    }

    pub fn session(&self) -> &CryptoSession {
        &self.session
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Send a request.
    ///
    /// Returns `Err` only when no response was received or the request
    /// could not be prepared. Authentication outcomes land in
    /// [`SecureResponse::err`].
    pub async fn execute(&self, request: impl Into<SecureRequest>) -> FetchResult<SecureResponse> {
        let request = request.into();
        let url = self.resolve(&request.path)?;

        let mut headers = self.headers.clone();
        headers.extend(request.headers);

        match request.method {
            Method::GET => self.get(url, headers).await,
            Method::POST => self.post(url, headers, &request.body).await,
            method => self.passthrough(method, url, headers, request.body).await,
        }
    }

    /// Join hostname and path into the normalized URL that goes on the wire.
    ///
    /// GET signatures cover this exact string, so it must match what the
    /// server sees after percent-encoding.
    fn resolve(&self, path: &str) -> FetchResult<String> {
        let joined = format!("{}{}", self.hostname, path);
        let url = reqwest::Url::parse(&joined)
            .map_err(|e| FetchError::InvalidUrl(format!("{joined}: {e}")))?;
        Ok(url.into())
    }

    async fn get(&self, url: String, mut headers: HashMap<String, String>) -> FetchResult<SecureResponse> {
        let token = self.session.sign_token(url.as_bytes())?;
        headers.set_header(AUTHORIZATION_HEADER, &token.encoded())?;

        debug!(%url, "Sending signed GET");

        let raw = self
            .transport
            .send(OutboundRequest {
                method: Method::GET,
                url,
                headers,
                body: None,
            })
            .await?;
        Ok(self.handle_response(raw))
    }

    async fn post(
        &self,
        url: String,
        mut headers: HashMap<String, String>,
        body: &RequestBody,
    ) -> FetchResult<SecureResponse> {
        let content = body.canonical()?;
        let encoded = self.session.encode_bytes(&content)?;

        headers.set_header(AUTHORIZATION_HEADER, &encoded.token.encoded())?;
        headers.set_header(CONTENT_TYPE_HEADER, ENVELOPE_CONTENT_TYPE)?;
        let envelope = PostEnvelope::encoded(encoded.data).to_json()?;

        debug!(%url, bytes = content.len(), "Sending encrypted POST");

        let raw = self
            .transport
            .send(OutboundRequest {
                method: Method::POST,
                url,
                headers,
                body: Some(envelope),
            })
            .await?;
        Ok(self.handle_response(raw))
    }

    async fn passthrough(
        &self,
        method: Method,
        url: String,
        headers: HashMap<String, String>,
        body: RequestBody,
    ) -> FetchResult<SecureResponse> {
        debug!(%method, %url, "Sending unauthenticated request");

        let body = match body {
            RequestBody::Empty => None,
            RequestBody::Text(text) => Some(text),
            RequestBody::Json(value) => Some(value.to_string()),
        };
        let raw = self
            .transport
            .send(OutboundRequest {
                method,
                url,
                headers,
                body,
            })
            .await?;
        Ok(SecureResponse::from_raw(raw))
    }

    fn handle_response(&self, raw: RawResponse) -> SecureResponse {
        let mut response = SecureResponse::from_raw(raw);

        match self.open(&response) {
            Ok((token, data)) => {
                response.token = Some(token);
                response.data = Some(data);
            }
            Err(err) => {
                warn!(url = %response.url, status = %response.status, "Response rejected: {}", err);
                response.err = Some(err);
            }
        }

        response
    }

    fn open(&self, response: &SecureResponse) -> Result<(Token, serde_json::Value), ResponseError> {
        if !response.ok() {
            return Err(ResponseError::Status(response.status));
        }

        let encoded = response
            .headers
            .header(AUTHORIZATION_HEADER)
            .ok_or(ResponseError::MissingToken)?;
        let token = Token::import(encoded).map_err(|e| ResponseError::Format(e.to_string()))?;

        let decoded = self
            .session
            .decode(&token, &response.body)
            .map_err(|e| ResponseError::Format(e.to_string()))?;

        if !decoded.is_valid {
            return Err(ResponseError::InvalidSignature);
        }
        Ok((token, decoded.payload))
    }
}
