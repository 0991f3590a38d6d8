//! Relay outcomes.
//!
//! Every inbound webhook ends in exactly one [`RelayResult`]. The HTTP layer
//! renders it; nothing downstream inspects transport errors directly.

use serde_json::{Value, json};

use super::signing::SigningError;

/// Message returned on a successful relay.
pub const SUCCESS_MESSAGE: &str = "Order sent";

/// Why a relay failed before reaching the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalErrorKind {
    /// Key material missing, mismatched or malformed.
    Configuration,
    /// Body or claims could not be serialized.
    Serialization,
    /// Anything else that failed locally.
    Internal,
}

/// Terminal state of one relay attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayResult {
    /// Remote answered 2xx.
    Success {
        /// Remote HTTP status.
        status: u16,
        /// Remote body.
        body: Value,
    },
    /// Inbound payload empty or not a JSON object; nothing was sent.
    BadRequest {
        /// What was wrong with the payload.
        reason: String,
    },
    /// Remote answered with a non-2xx status.
    RemoteRejected {
        /// Remote HTTP status.
        status: u16,
        /// Remote body.
        body: Value,
    },
    /// Request was sent but no response arrived (connect error, timeout).
    NoResponse {
        /// Transport error text.
        cause: String,
    },
    /// Failed before any network call.
    LocalError {
        /// Failure class.
        kind: LocalErrorKind,
        /// Error text.
        cause: String,
    },
}

impl RelayResult {
    /// Stable category label for responses, logs and metrics.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::BadRequest { .. } => "bad_request",
            Self::RemoteRejected { .. } => "remote_rejected",
            Self::NoResponse { .. } => "no_response",
            Self::LocalError {
                kind: LocalErrorKind::Configuration,
                ..
            } => "configuration_error",
            Self::LocalError { .. } => "local_error",
        }
    }

    /// HTTP status returned to the inbound caller.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Success { .. } => 200,
            Self::BadRequest { .. } => 400,
            Self::RemoteRejected { .. } | Self::NoResponse { .. } | Self::LocalError { .. } => {
                500
            }
        }
    }

    /// Whether the remote accepted the order.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// JSON body returned to the inbound caller.
    #[must_use]
    pub fn response_body(&self) -> Value {
        let category = self.category();
        match self {
            Self::Success { body, .. } => json!({
                "status": SUCCESS_MESSAGE,
                "data": body,
            }),
            Self::BadRequest { reason } => json!({
                "error": "Request body is empty or invalid",
                "details": reason,
                "category": category,
            }),
            Self::RemoteRejected { status, body } => json!({
                "error": format!("Coinbase API error ({status})"),
                "details": body,
                "category": category,
            }),
            Self::NoResponse { cause } => json!({
                "error": "Could not reach the Coinbase API or the request timed out",
                "details": cause,
                "category": category,
            }),
            Self::LocalError {
                kind: LocalErrorKind::Configuration,
                cause,
            } => json!({
                "error": "Signing configuration error",
                "details": cause,
                "category": category,
            }),
            Self::LocalError { cause, .. } => json!({
                "error": "Internal server error",
                "details": cause,
                "category": category,
            }),
        }
    }
}

impl From<SigningError> for RelayResult {
    fn from(err: SigningError) -> Self {
        let kind = if err.is_configuration() {
            LocalErrorKind::Configuration
        } else if matches!(err, SigningError::Serialization(_)) {
            LocalErrorKind::Serialization
        } else {
            LocalErrorKind::Internal
        };

        Self::LocalError {
            kind,
            cause: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signing::SigningScheme;
    use test_case::test_case;

    #[test]
    fn success_wraps_remote_body() {
        let result = RelayResult::Success {
            status: 200,
            body: json!({"order_id": "abc"}),
        };

        assert_eq!(result.http_status(), 200);
        assert_eq!(
            result.response_body(),
            json!({"status": "Order sent", "data": {"order_id": "abc"}})
        );
    }

    #[test]
    fn remote_rejection_mirrors_status_and_body() {
        let result = RelayResult::RemoteRejected {
            status: 401,
            body: json!({"error": "unauthorized"}),
        };

        let body = result.response_body();
        assert_eq!(result.http_status(), 500);
        assert_eq!(body["error"], "Coinbase API error (401)");
        assert_eq!(body["details"], json!({"error": "unauthorized"}));
        assert_eq!(body["category"], "remote_rejected");
    }

    #[test_case(
        RelayResult::BadRequest { reason: "empty".into() }, 400, "bad_request" ; "bad request"
    )]
    #[test_case(
        RelayResult::NoResponse { cause: "timed out".into() }, 500, "no_response" ; "no response"
    )]
    #[test_case(
        RelayResult::LocalError { kind: LocalErrorKind::Configuration, cause: "x".into() },
        500, "configuration_error" ; "configuration"
    )]
    #[test_case(
        RelayResult::LocalError { kind: LocalErrorKind::Serialization, cause: "x".into() },
        500, "local_error" ; "serialization"
    )]
    fn failure_categories(result: RelayResult, status: u16, category: &str) {
        assert!(!result.is_success());
        assert_eq!(result.http_status(), status);
        assert_eq!(result.category(), category);
        assert_eq!(result.response_body()["category"], category);
    }

    #[test_case(SigningError::MissingKeyMaterial(SigningScheme::JwtEs256), LocalErrorKind::Configuration)]
    #[test_case(SigningError::MalformedKey("bad pem".into()), LocalErrorKind::Configuration)]
    #[test_case(SigningError::Serialization("nope".into()), LocalErrorKind::Serialization)]
    #[test_case(SigningError::Signing("rng".into()), LocalErrorKind::Internal)]
    fn signing_errors_become_local_errors(err: SigningError, expected: LocalErrorKind) {
        let RelayResult::LocalError { kind, cause } = RelayResult::from(err.clone()) else {
            panic!("expected local error");
        };
        assert_eq!(kind, expected);
        assert_eq!(cause, err.to_string());
    }
}
