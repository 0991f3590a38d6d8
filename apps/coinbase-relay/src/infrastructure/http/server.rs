//! Listener and shutdown handling.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;

/// Server error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listen socket could not be bound.
    #[error("failed to bind port {0}: {1}")]
    BindFailed(u16, String),
    /// The server loop exited with an error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

/// Serve `router` on `0.0.0.0:port` until a shutdown signal arrives.
pub async fn serve(port: u16, router: Router) -> Result<(), ServerError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::BindFailed(port, e.to_string()))?;

    tracing::info!(%addr, "Relay listening");
    tracing::info!("  POST /webhook  - relay order to Coinbase");
    tracing::info!("  POST /order    - alias of /webhook");
    tracing::info!("  GET  /health   - health check");
    tracing::info!("  GET  /metrics  - Prometheus metrics");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::ServerFailed(e.to_string()))?;

    tracing::info!("Relay stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
#[allow(clippy::expect_used)]
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
