//! Startup orchestration.
//!
//! # Responsibilities
//! - Report missing bucket settings (requests will fail until they are set)
//! - Build the server, bind the listener, install signal handling
//!
//! # Design Decisions
//! - Fail fast on listener and client errors
//! - Listener binds last (traffic only when ready)

use tokio::net::TcpListener;

use crate::config::validation::missing_s3_settings;
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;

/// Fatal startup failures.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    #[error("failed to initialise proxy: {0}")]
    Proxy(#[from] ProxyError),
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Run the proxy until SIGINT/SIGTERM.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    let missing = missing_s3_settings(&config.s3);
    if !missing.is_empty() {
        tracing::warn!(
            missing = ?missing,
            "Bucket settings incomplete; requests will fail until they are configured"
        );
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        bucket = config.s3.bucket.as_deref().unwrap_or("<unset>"),
        region = config.s3.region.as_deref().unwrap_or("<unset>"),
        path_prefix = %config.s3.path_prefix,
        s3_path_prefix = %config.s3.s3_path_prefix,
        removed_query_params = ?config.s3.remove_query_params,
        "Configuration loaded"
    );

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address.clone(),
            source,
        })?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, server_shutdown).await?;
    Ok(())
}
