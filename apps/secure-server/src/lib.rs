//! Reference server mounting the secure session middleware

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Query,
    middleware::from_fn_with_state,
    response::Response,
    routing::{get, post},
};
use secure_middleware::{MiddlewareResult, SecureResponder, SecureSessionConfig, require_secure_session};
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Build the application router.
///
/// Every route except `/health` sits behind the secure session.
pub fn router(config: Arc<SecureSessionConfig>) -> Router {
    Router::new()
        .route("/getSend", get(get_send))
        .route("/getJson", get(get_json))
        .route("/postSend", post(post_send))
        .route("/postJson", post(post_json))
        .route_layer(from_fn_with_state(config, require_secure_session))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct Challenge {
    challenge: Option<String>,
}

/// Echo the `challenge` query parameter as text
async fn get_send(secure: SecureResponder, Query(query): Query<Challenge>) -> MiddlewareResult<Response> {
    debug!("getSend");
    secure.send(query.challenge.unwrap_or_else(|| "failed".to_string()))
}

/// Echo the query string as a JSON object
async fn get_json(
    secure: SecureResponder,
    Query(query): Query<BTreeMap<String, String>>,
) -> MiddlewareResult<Response> {
    debug!(params = query.len(), "getJson");
    secure.json(&query)
}

/// Echo the `challenge` field of the decoded body as text
async fn post_send(secure: SecureResponder, Json(body): Json<Challenge>) -> MiddlewareResult<Response> {
    debug!("postSend");
    secure.send(body.challenge.unwrap_or_else(|| "failed".to_string()))
}

/// Echo the decoded body: JSON stays JSON, text stays text
async fn post_json(secure: SecureResponder, body: String) -> MiddlewareResult<Response> {
    let payload: Value = crypto_session::revive(body.as_bytes());
    debug!(is_object = payload.is_object(), "postJson");
    secure.json(&payload)
}
