//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler on every path
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener
//! - Map handler errors to responses in one place
//! - Drain in-flight requests on shutdown

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::forward::Forwarder;
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::proxy::ProxyHandler;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ProxyHandler>,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        Self::with_forwarder(config, Forwarder::new()?)
    }

    /// Create a server that forwards through the given transport.
    pub fn with_forwarder(config: ProxyConfig, forwarder: Forwarder) -> Result<Self, ProxyError> {
        let proxy = Arc::new(ProxyHandler::new(config.s3, forwarder)?);
        let router = Self::build_router(AppState { proxy });
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// There is no inbound timeout layer; a slow bucket is waited on for as
    /// long as the transport allows.
    fn build_router(state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        request_id = %request_id(request),
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID));

        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(middleware)
    }

    /// The router, for serving or for driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until a
    /// shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Rewrites, signs and forwards the request; the inbound body is not sent on.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request).to_string();
    let (parts, _body) = request.into_parts();

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
        "Proxying request"
    );

    match state.proxy.handle(&parts.method, &parts.uri).await {
        Ok(response) => {
            let status = response.status();
            if status.is_success() {
                tracing::info!(
                    request_id = %request_id,
                    status = status.as_u16(),
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    "Request forwarded"
                );
            } else {
                tracing::warn!(
                    request_id = %request_id,
                    status = status.as_u16(),
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    "Bucket returned an error status"
                );
            }
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                kind = e.kind(),
                error = %e,
                "Request failed"
            );
            e.into_response()
        }
    }
}
