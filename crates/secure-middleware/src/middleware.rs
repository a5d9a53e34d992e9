//! Request authentication

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{OriginalUri, Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use axum::http::{Method, request::Parts};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use crypto_session::{CryptoSession, Token};
use serde_json::Value;
use shared_protocol::{
    AUTHORIZATION_HEADER, HeaderCarrier, JSON_CONTENT_TYPE, PostEnvelope, TEXT_CONTENT_TYPE,
};
use tracing::{debug, warn};

use crate::{MiddlewareError, MiddlewareResult, SecureContext, SecureSessionConfig};

/// Fail closed: only authenticated requests reach the handler.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn require_secure_session(
    State(config): State<Arc<SecureSessionConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match authenticate(&config, request).await {
        Ok((request, true)) => next.run(request).await,
        Ok((request, false)) => {
            warn!(method = %request.method(), uri = %request.uri(), "Rejected unauthenticated request");
            MiddlewareError::Unauthenticated.into_response()
        }
        Err(e) => {
            warn!("Secure session failed: {}", e);
            e.into_response()
        }
    }
}

/// Attach the session but let the handler decide.
///
/// Handlers read [`SecureContext::is_authenticated`]. A missing or
/// malformed token is still rejected, since there is no session to attach.
pub async fn inspect_secure_session(
    State(config): State<Arc<SecureSessionConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match authenticate(&config, request).await {
        Ok((request, _)) => next.run(request).await,
        Err(e) => {
            warn!("Secure session failed: {}", e);
            e.into_response()
        }
    }
}

/// Validate a request and attach its [`SecureContext`].
///
/// GET requests are checked by signature over `config.host` plus the
/// request path and query. POST envelopes are decrypted and, when valid,
/// the handler sees the decoded payload as the body. Any other method is
/// left unauthenticated.
pub async fn authenticate(
    config: &SecureSessionConfig,
    request: Request,
) -> MiddlewareResult<(Request, bool)> {
    let (mut parts, body) = request.into_parts();

    let token = Token::import(parts.headers.require_header(AUTHORIZATION_HEADER)?)?;
    let session = CryptoSession::new(token.peer_key()?, config.secret.clone());

    let method = parts.method.clone();
    let (is_authenticated, body) = match method {
        Method::GET => {
            let url = canonical_url(config, &parts);
            (session.verify(&token, url.as_bytes())?, body)
        }
        Method::POST => {
            let bytes = axum::body::to_bytes(body, config.body_limit)
                .await
                .map_err(|e| MiddlewareError::Body(e.to_string()))?;
            open_envelope(&session, &token, &mut parts, bytes)?
        }
        _ => (false, body),
    };

    debug!(
        peer = %token.public_hex(),
        method = %parts.method,
        is_authenticated,
        "Secure session attached"
    );

    parts.extensions.insert(SecureContext {
        token,
        session,
        is_authenticated,
    });

    Ok((Request::from_parts(parts, body), is_authenticated))
}

/// Configured host plus the path and query the client addressed
fn canonical_url(config: &SecureSessionConfig, parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{}{}", config.host, path)
}

fn open_envelope(
    session: &CryptoSession,
    token: &Token,
    parts: &mut Parts,
    bytes: Bytes,
) -> MiddlewareResult<(bool, Body)> {
    let envelope = PostEnvelope::from_json(&bytes)?;
    if !envelope.is_encoded() {
        set_body_headers(parts, TEXT_CONTENT_TYPE);
        return Ok((false, Body::from(envelope.data)));
    }

    let decoded = session.decode(token, envelope.ciphertext()?)?;
    if !decoded.is_valid {
        return Ok((false, Body::from(bytes)));
    }

    let (content_type, body) = match decoded.payload {
        Value::String(text) => (TEXT_CONTENT_TYPE, text),
        other => (JSON_CONTENT_TYPE, other.to_string()),
    };
    set_body_headers(parts, content_type);

    Ok((true, Body::from(body)))
}

/// Describe a replaced body: the envelope's length and type no longer apply
fn set_body_headers(parts: &mut Parts, content_type: &'static str) {
    parts.headers.remove(CONTENT_LENGTH);
    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
}
