#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements,
        clippy::panic
    )
)]

//! Coinbase Relay - Signed Order Forwarding
//!
//! Receives order payloads over a webhook, signs them for the Coinbase
//! Advanced Trade API, forwards them once and reports the outcome.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure signing and classification logic
//!   - `canonical`: Key-sorted, whitespace-free JSON
//!   - `signing`: ES256 JWT and HMAC-SHA256 credentials
//!   - `relay`: Terminal outcomes and their HTTP rendering
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: `OrderGateway` for the outbound call
//!   - `use_cases`: `RelayOrderUseCase`
//!
//! - **Infrastructure**: Adapters
//!   - `coinbase`: reqwest client implementing `OrderGateway`
//!   - `http`: axum webhook, health and metrics routes
//!   - `config`, `telemetry`, `metrics`
//!
//! # Data Flow
//!
//! ```text
//! webhook ──► validate ──► sign(method, path, body) ──► POST /api/v3/brokerage/orders
//!                                                          │
//! response ◄── RelayResult ◄── classify(status | timeout) ◄─┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - signing and outcome types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

pub use domain::canonical::{CanonicalValue, canonical_body, canonicalize};
pub use domain::relay::{LocalErrorKind, RelayResult};
pub use domain::signing::{
    Credential, HmacSha256Signer, JwtEs256Signer, JwtOptions, JwtSubject, KeyMaterial, RequestSigner,
    SignedRequest, SigningError, SigningRequest, SigningScheme, build_signer, sign,
};

pub use application::ports::{DispatchOutcome, OrderGateway, OutboundRequest};
pub use application::use_cases::{ORDERS_PATH, RelayOrderUseCase};

pub use infrastructure::coinbase::{CoinbaseError, CoinbaseHttpClient};
pub use infrastructure::config::{ConfigError, RelayConfig};
pub use infrastructure::http::{AppState, ServerError, create_router};
pub use infrastructure::metrics::init_metrics;
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
