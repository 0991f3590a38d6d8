//! Relay Order Use Case
//!
//! `Received -> Validated -> Signed -> Dispatched -> RelayResult`.
//! Exactly one outbound attempt per inbound payload; nothing is retried.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::application::ports::{DispatchOutcome, OrderGateway, OutboundRequest};
use crate::domain::relay::{LocalErrorKind, RelayResult};
use crate::domain::signing::{RequestSigner, SigningError, SigningRequest};

/// Brokerage order-creation path.
pub const ORDERS_PATH: &str = "/api/v3/brokerage/orders";

const ORDERS_METHOD: &str = "POST";

/// Use case for relaying one order payload to the brokerage.
pub struct RelayOrderUseCase<G>
where
    G: OrderGateway,
{
    signer: Result<Arc<dyn RequestSigner>, SigningError>,
    gateway: Arc<G>,
    clock: fn() -> i64,
}

impl<G> RelayOrderUseCase<G>
where
    G: OrderGateway,
{
    /// Create a new `RelayOrderUseCase`.
    ///
    /// A signer that failed to build is kept as its error; every relay then
    /// ends in a configuration-kind local error without touching the network.
    pub fn new(signer: Result<Arc<dyn RequestSigner>, SigningError>, gateway: Arc<G>) -> Self {
        Self {
            signer,
            gateway,
            clock: || Utc::now().timestamp(),
        }
    }

    /// Override the issue-time source (unix seconds).
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Whether signing credentials loaded successfully.
    #[must_use]
    pub const fn credentials_loaded(&self) -> bool {
        self.signer.is_ok()
    }

    /// Relay a raw inbound body.
    pub async fn relay(&self, payload: &[u8]) -> RelayResult {
        match parse_payload(payload) {
            Ok(order) => self.relay_order(order).await,
            Err(reason) => {
                tracing::warn!(reason = %reason, "Rejected inbound payload");
                RelayResult::BadRequest { reason }
            }
        }
    }

    async fn relay_order(&self, order: Value) -> RelayResult {
        let signer = match &self.signer {
            Ok(signer) => signer,
            Err(err) => {
                tracing::error!(error = %err, "Signing credentials unavailable");
                return RelayResult::from(err.clone());
            }
        };

        let request = SigningRequest::new(ORDERS_METHOD, ORDERS_PATH, Some(order), (self.clock)());
        let signed = match signer.sign(&request) {
            Ok(signed) => signed,
            Err(err) => {
                tracing::error!(error = %err, scheme = %signer.scheme(), "Failed to sign request");
                return RelayResult::from(err);
            }
        };

        tracing::debug!(
            method = %signed.method,
            path = %signed.path,
            scheme = %signer.scheme(),
            "Dispatching signed order"
        );

        match self.gateway.dispatch(OutboundRequest::from(signed)).await {
            DispatchOutcome::Ok { status, body } => RelayResult::Success { status, body },
            DispatchOutcome::HttpError { status, body } => {
                tracing::warn!(status, body = %body, "Coinbase rejected order");
                RelayResult::RemoteRejected { status, body }
            }
            DispatchOutcome::TransportError { cause } => {
                tracing::warn!(cause = %cause, "No response from Coinbase");
                RelayResult::NoResponse { cause }
            }
            DispatchOutcome::LocalError { cause } => {
                tracing::error!(cause = %cause, "Outbound request could not be built");
                RelayResult::LocalError {
                    kind: LocalErrorKind::Internal,
                    cause,
                }
            }
        }
    }
}

/// Accept only a non-empty JSON object.
fn parse_payload(payload: &[u8]) -> Result<Value, String> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Err("request body is empty".to_string());
    }

    let value: Value =
        serde_json::from_slice(payload).map_err(|e| format!("request body is not valid JSON: {e}"))?;

    match value {
        Value::Object(ref map) if map.is_empty() => Err("request body is an empty object".to_string()),
        Value::Object(_) => Ok(value),
        _ => Err("request body must be a JSON object".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signing::{Credential, HmacSha256Signer, SigningScheme};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use test_case::test_case;

    struct MockGateway {
        outcome: DispatchOutcome,
        sent: Mutex<Vec<OutboundRequest>>,
    }

    impl MockGateway {
        fn new(outcome: DispatchOutcome) -> Self {
            Self {
                outcome,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<OutboundRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OrderGateway for MockGateway {
        async fn dispatch(&self, request: OutboundRequest) -> DispatchOutcome {
            self.sent.lock().unwrap().push(request);
            self.outcome.clone()
        }
    }

    fn hmac_signer() -> Result<Arc<dyn RequestSigner>, SigningError> {
        Ok(Arc::new(HmacSha256Signer::new("api-key", "test-secret").unwrap()))
    }

    fn use_case(outcome: DispatchOutcome) -> (RelayOrderUseCase<MockGateway>, Arc<MockGateway>) {
        let gateway = Arc::new(MockGateway::new(outcome));
        let use_case =
            RelayOrderUseCase::new(hmac_signer(), Arc::clone(&gateway)).with_clock(|| 1_700_000_000);
        (use_case, gateway)
    }

    fn ok_outcome() -> DispatchOutcome {
        DispatchOutcome::Ok {
            status: 200,
            body: json!({"order_id": "abc"}),
        }
    }

    #[tokio::test]
    async fn relays_signed_order_once() {
        let (use_case, gateway) = use_case(ok_outcome());

        let result = use_case
            .relay(br#"{"product_id":"BTC-USD","side":"BUY"}"#)
            .await;

        assert_eq!(
            result,
            RelayResult::Success {
                status: 200,
                body: json!({"order_id": "abc"})
            }
        );

        let sent = gateway.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, "POST");
        assert_eq!(sent[0].path, ORDERS_PATH);
        assert_eq!(
            sent[0].body.as_deref(),
            Some(r#"{"product_id":"BTC-USD","side":"BUY"}"#)
        );
        assert_eq!(
            sent[0].credential,
            Credential::AccessKey {
                api_key: "api-key".to_string(),
                signature: "zxqe9/X5oKyRdAJN0YdvLJjB5nxWuvrR1XBwdlnGzp8=".to_string(),
                timestamp: 1_700_000_000,
            }
        );
    }

    #[test_case(b"" ; "empty body")]
    #[test_case(b"   " ; "whitespace")]
    #[test_case(b"{}" ; "empty object")]
    #[test_case(b"[1,2]" ; "array")]
    #[test_case(b"null" ; "null")]
    #[test_case(b"\"order\"" ; "string")]
    #[test_case(b"{\"side\":" ; "malformed json")]
    #[tokio::test]
    async fn invalid_payload_is_bad_request_without_dispatch(payload: &[u8]) {
        let (use_case, gateway) = use_case(ok_outcome());

        let result = use_case.relay(payload).await;

        assert!(matches!(result, RelayResult::BadRequest { .. }));
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_dispatch() {
        let gateway = Arc::new(MockGateway::new(ok_outcome()));
        let use_case = RelayOrderUseCase::new(
            Err(SigningError::MissingKeyMaterial(SigningScheme::JwtEs256)),
            Arc::clone(&gateway),
        );

        let result = use_case.relay(br#"{"side":"BUY"}"#).await;

        assert!(!use_case.credentials_loaded());
        assert!(matches!(
            result,
            RelayResult::LocalError {
                kind: LocalErrorKind::Configuration,
                ..
            }
        ));
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn remote_rejection_is_mirrored() {
        let (use_case, _) = use_case(DispatchOutcome::HttpError {
            status: 401,
            body: json!({"error": "unauthorized"}),
        });

        let result = use_case.relay(br#"{"side":"BUY"}"#).await;

        assert_eq!(
            result,
            RelayResult::RemoteRejected {
                status: 401,
                body: json!({"error": "unauthorized"})
            }
        );
    }

    #[tokio::test]
    async fn transport_failure_is_no_response() {
        let (use_case, gateway) = use_case(DispatchOutcome::TransportError {
            cause: "operation timed out".to_string(),
        });

        let result = use_case.relay(br#"{"side":"BUY"}"#).await;

        assert_eq!(
            result,
            RelayResult::NoResponse {
                cause: "operation timed out".to_string()
            }
        );
        assert_eq!(gateway.sent().len(), 1);
    }

    #[tokio::test]
    async fn unbuildable_request_is_local_error() {
        let (use_case, gateway) = use_case(DispatchOutcome::LocalError {
            cause: "builder error".to_string(),
        });

        let result = use_case.relay(br#"{"side":"BUY"}"#).await;

        assert_eq!(
            result,
            RelayResult::LocalError {
                kind: LocalErrorKind::Internal,
                cause: "builder error".to_string()
            }
        );
        assert_eq!(result.category(), "local_error");
        assert_eq!(gateway.sent().len(), 1);
    }
}
