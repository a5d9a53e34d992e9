//! Crypto Session reference server
//!
//! Serves the demonstration routes behind the secure session middleware.

use std::net::SocketAddr;
use std::sync::Arc;

use secure_middleware::SecureSessionConfig;
use tracing::info;

/// Environment variable overriding the listen address
const BIND_VAR: &str = "CRYPTO_SESSION_BIND";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("secure_server=debug".parse()?)
                .add_directive("secure_middleware=debug".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Starting Crypto Session Server");

    let config = SecureSessionConfig::from_env()?;
    info!("Server public key: {}", config.public_key());
    info!("Canonical host: {}", config.host);

    let app = secure_server::router(Arc::new(config));

    let addr: SocketAddr = std::env::var(BIND_VAR)
        .unwrap_or_else(|_| "0.0.0.0:3001".to_string())
        .parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
