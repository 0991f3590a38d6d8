//! HTTP adapter.
//!
//! Inbound webhook endpoints plus health and metrics, served with axum.

mod controller;
mod response;
mod server;

pub use controller::{AppState, create_router};
pub use response::{HealthResponse, RelayResponse};
pub use server::{ServerError, serve, shutdown_signal};
