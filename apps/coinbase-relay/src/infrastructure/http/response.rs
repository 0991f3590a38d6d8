//! HTTP response types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::domain::relay::RelayResult;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Active signing scheme.
    pub signing_scheme: String,
    /// Whether signing key material loaded.
    pub credentials_loaded: bool,
}

/// Renders a [`RelayResult`] as the inbound HTTP response.
#[derive(Debug)]
pub struct RelayResponse(pub RelayResult);

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.response_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::relay::LocalErrorKind;
    use serde_json::json;

    #[test]
    fn health_response_shape() {
        let resp = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            signing_scheme: "jwt-es256".to_string(),
            credentials_loaded: false,
        };

        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({
                "status": "healthy",
                "version": "0.1.0",
                "signing_scheme": "jwt-es256",
                "credentials_loaded": false
            })
        );
    }

    #[test]
    fn relay_response_status_codes() {
        let ok = RelayResponse(RelayResult::Success {
            status: 201,
            body: json!({}),
        });
        let bad = RelayResponse(RelayResult::BadRequest {
            reason: "empty".to_string(),
        });
        let local = RelayResponse(RelayResult::LocalError {
            kind: LocalErrorKind::Configuration,
            cause: "missing".to_string(),
        });

        assert_eq!(ok.into_response().status(), StatusCode::OK);
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(local.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
