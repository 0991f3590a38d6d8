//! Infrastructure Layer - Adapters and external integrations.

/// Coinbase REST client implementing the order gateway port.
pub mod coinbase;

/// Configuration loaded from the environment.
pub mod config;

/// Inbound HTTP server.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Tracing subscriber and OpenTelemetry integration.
pub mod telemetry;
