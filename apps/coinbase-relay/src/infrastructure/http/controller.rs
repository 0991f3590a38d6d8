//! HTTP Controller (Driver Adapter)
//!
//! Axum routes delegating to the relay use case.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::Instrument;
use uuid::Uuid;

use crate::application::ports::OrderGateway;
use crate::application::use_cases::RelayOrderUseCase;
use crate::domain::signing::SigningScheme;
use crate::infrastructure::metrics::{self, get_metrics_handle};

use super::response::{HealthResponse, RelayResponse};

/// Application state shared across handlers.
pub struct AppState<G>
where
    G: OrderGateway,
{
    /// Relay use case.
    pub relay: Arc<RelayOrderUseCase<G>>,
    /// Configured signing scheme.
    pub scheme: SigningScheme,
    /// Application version.
    pub version: String,
}

impl<G> Clone for AppState<G>
where
    G: OrderGateway,
{
    fn clone(&self) -> Self {
        Self {
            relay: Arc::clone(&self.relay),
            scheme: self.scheme,
            version: self.version.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router<G>(state: AppState<G>) -> Router
where
    G: OrderGateway + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/webhook", post(relay_order))
        .route("/order", post(relay_order))
        .with_state(state)
}

async fn health_check<G>(State(state): State<AppState<G>>) -> impl IntoResponse
where
    G: OrderGateway,
{
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        signing_scheme: state.scheme.to_string(),
        credentials_loaded: state.relay.credentials_loaded(),
    })
}

async fn metrics_handler() -> impl IntoResponse {
    let body = get_metrics_handle().map(|handle| handle.render()).unwrap_or_default();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// Relay one inbound payload. The body is taken raw so that malformed JSON
/// is answered with the relay's own 400 shape.
async fn relay_order<G>(State(state): State<AppState<G>>, body: Bytes) -> impl IntoResponse
where
    G: OrderGateway,
{
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("relay", %request_id);

    async move {
        let started = Instant::now();
        tracing::info!(bytes = body.len(), "Webhook received");

        let result = state.relay.relay(&body).await;
        metrics::record_outcome(&result);

        tracing::info!(
            outcome = result.category(),
            status = result.http_status(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Webhook handled"
        );

        ([("x-request-id", request_id.to_string())], RelayResponse(result))
    }
    .instrument(span)
    .await
}
