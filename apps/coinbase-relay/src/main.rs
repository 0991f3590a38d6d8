//! Coinbase Relay Binary
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin coinbase-relay
//! ```
//!
//! # Environment Variables
//!
//! ## Credentials (per `SIGNING_SCHEME`)
//! - `API_KEY_ID`, `PRIVATE_KEY`: CDP key name and PEM key (jwt)
//! - `API_KEY`, `API_SECRET`: legacy key and secret (hmac)
//!
//! ## Optional
//! - `SIGNING_SCHEME`: jwt | hmac (default: jwt)
//! - `JWT_SUBJECT`: request-hash | key-id (default: request-hash)
//! - `JWT_TTL_SECS`: token lifetime, 60-180 (default: 60)
//! - `OUTBOUND_TIMEOUT_SECS`: outbound timeout, below the TTL (default: 30)
//! - `COINBASE_API_BASE_URL`: (default: <https://api.coinbase.com>)
//! - `PORT`: HTTP port (default: 3000)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use coinbase_relay::application::use_cases::RelayOrderUseCase;
use coinbase_relay::domain::signing::build_signer;
use coinbase_relay::infrastructure::coinbase::CoinbaseHttpClient;
use coinbase_relay::infrastructure::config::RelayConfig;
use coinbase_relay::infrastructure::http::{AppState, create_router, serve};
use coinbase_relay::infrastructure::{metrics, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv();
    let _telemetry = telemetry::init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Coinbase Relay");

    let config = RelayConfig::from_env()?;
    log_config(&config);

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Prometheus recorder not installed; /metrics will be empty");
    }

    let signer = build_signer(config.scheme, config.key_material.as_ref(), config.jwt);
    match &signer {
        Ok(_) => tracing::info!(scheme = %config.scheme, "Signing credentials loaded"),
        Err(e) => tracing::warn!(
            scheme = %config.scheme,
            error = %e,
            "Signing credentials unavailable; every relay will fail until they are configured"
        ),
    }

    let gateway = Arc::new(CoinbaseHttpClient::new(&config.coinbase)?);
    let state = AppState {
        relay: Arc::new(RelayOrderUseCase::new(signer, gateway)),
        scheme: config.scheme,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    serve(config.server.port, create_router(state)).await?;

    tracing::info!("Coinbase Relay shutdown complete");
    Ok(())
}

fn log_config(config: &RelayConfig) {
    tracing::info!(
        scheme = %config.scheme,
        jwt_subject = ?config.jwt.subject,
        jwt_ttl_secs = config.jwt.ttl_secs,
        base_url = %config.coinbase.base_url,
        timeout_secs = config.coinbase.timeout.as_secs(),
        port = config.server.port,
        "Configuration loaded"
    );

    let missing = config.missing_credentials();
    if !missing.is_empty() {
        tracing::warn!(missing = ?missing, "Credential environment variables not set");
    }
}

fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}
