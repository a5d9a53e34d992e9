//! Pluggable HTTP transport

use std::collections::HashMap;
use std::future::Future;

use http::{HeaderMap, Method, StatusCode};

use crate::{FetchError, FetchResult};

/// Fully prepared request, after signing and encryption
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

/// Response as received from the wire
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub url: String,
    pub headers: HeaderMap,
    pub body: String,
}

/// Sends one request and reads the full response body.
///
/// Only genuine transport failures (connection refused, reset, timeouts)
/// should be returned as errors; any HTTP status is a successful send.
pub trait Transport: Send + Sync {
    fn send(&self, request: OutboundRequest)
    -> impl Future<Output = FetchResult<RawResponse>> + Send;
}

/// Transport backed by `reqwest`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> FetchResult<RawResponse> {
        let mut builder = self.client.request(request.method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        let url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(RawResponse {
            status,
            url,
            headers,
            body,
        })
    }
}
