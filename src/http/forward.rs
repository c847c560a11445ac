//! Upstream transport.
//!
//! # Responsibilities
//! - Send the signed request to the bucket endpoint over HTTP(S)
//! - Relay status, reason phrase and headers, stream the body without buffering
//!
//! # Design Decisions
//! - Single attempt: no retries, no timeout override
//! - Redirects follow the client's default policy
//! - One pooled client shared by every request

use axum::body::Body;
use axum::http::Response;
use hyper::ext::ReasonPhrase;

use crate::error::ProxyError;
use crate::proxy::OutboundRequest;

/// Sends outbound requests through a shared, pooled HTTP client.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new() -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Perform the round trip.
    ///
    /// Any status the backend answers with is returned as-is; only transport
    /// failures are errors.
    pub async fn send(&self, request: OutboundRequest) -> Result<Response<Body>, ProxyError> {
        let OutboundRequest {
            method,
            url,
            headers,
        } = request;

        let mut upstream = self
            .client
            .request(method, url)
            .headers(headers)
            .send()
            .await?;

        let status = upstream.status();
        let headers = std::mem::take(upstream.headers_mut());
        // Only present when the bucket's phrase differs from the canonical one.
        let reason = upstream.extensions().get::<ReasonPhrase>().cloned();

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        if let Some(reason) = reason {
            response.extensions_mut().insert(reason);
        }
        Ok(response)
    }
}
