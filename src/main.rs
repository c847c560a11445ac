//! S3 Signing Proxy
//!
//! Serves a private S3 bucket over plain HTTP by signing every forwarded
//! request with AWS Signature V4.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │                S3 SIGNING PROXY               │
//!                         │                                               │
//!   Client Request        │  ┌─────────┐   ┌──────────┐   ┌───────────┐   │
//!   ──────────────────────┼─▶│  http   │──▶│  proxy   │──▶│  signing  │   │
//!                         │  │ server  │   │ rewrite  │   │  SigV4    │   │
//!                         │  └─────────┘   │ + query  │   └─────┬─────┘   │
//!                         │                └──────────┘         │         │
//!                         │                                     ▼         │
//!   Client Response       │  ┌──────────┐                 ┌───────────┐   │
//!   ◀─────────────────────┼──│ response │◀────────────────│  forward  │◀──┼── S3 bucket
//!                         │  │ adjuster │                 │  (HTTPS)  │   │
//!                         │  └──────────┘                 └───────────┘   │
//!                         │                                               │
//!                         │  config · lifecycle · observability           │
//!                         └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use s3_signing_proxy::config::load_config;
use s3_signing_proxy::lifecycle::startup;
use s3_signing_proxy::observability::init_logging;

#[derive(Parser)]
#[command(name = "s3-signing-proxy")]
#[command(about = "Forward HTTP requests to a private S3 bucket with SigV4 signing", long_about = None)]
struct Cli {
    /// TOML configuration file; environment variables override its values.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Listener address, overriding the configuration.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let bind = cli.bind;
    let config = match load_config(cli.config.as_deref(), |config| {
        if let Some(bind) = bind {
            config.listener.bind_address = bind;
        }
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("Failed to set logger: {}", e);
    }

    tracing::info!("s3-signing-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    match startup::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Proxy stopped with an error");
            ExitCode::FAILURE
        }
    }
}
