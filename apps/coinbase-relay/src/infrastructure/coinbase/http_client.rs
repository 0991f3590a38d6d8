//! HTTP client for the brokerage order endpoint.
//!
//! One attempt per call. The body text handed in by the signer is sent as is;
//! re-serializing it here would break the signature.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde_json::Value;

use crate::application::ports::{DispatchOutcome, OrderGateway, OutboundRequest};
use crate::infrastructure::config::CoinbaseSettings;
use crate::infrastructure::metrics;

/// Errors raised while building the client.
#[derive(Debug, thiserror::Error)]
pub enum CoinbaseError {
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Coinbase REST client.
#[derive(Debug, Clone)]
pub struct CoinbaseHttpClient {
    client: Client,
    base_url: String,
}

impl CoinbaseHttpClient {
    /// Create a new client from settings.
    pub fn new(settings: &CoinbaseSettings) -> Result<Self, CoinbaseError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| CoinbaseError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl OrderGateway for CoinbaseHttpClient {
    async fn dispatch(&self, request: OutboundRequest) -> DispatchOutcome {
        let url = format!("{}{}", self.base_url, request.path);
        let Ok(method) = Method::from_bytes(request.method.as_bytes()) else {
            return DispatchOutcome::LocalError {
                cause: format!("unsupported method: {}", request.method),
            };
        };

        let mut builder = self
            .client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in request.credential.headers() {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                tracing::error!(error = %e, url = %url, "Outbound request could not be built");
                return DispatchOutcome::LocalError {
                    cause: e.to_string(),
                };
            }
            Err(e) => {
                metrics::record_outbound_latency(started.elapsed());
                tracing::warn!(error = %e, timeout = e.is_timeout(), url = %url, "Outbound request failed");
                return DispatchOutcome::TransportError {
                    cause: e.to_string(),
                };
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                metrics::record_outbound_latency(started.elapsed());
                return DispatchOutcome::TransportError {
                    cause: format!("failed to read response body: {e}"),
                };
            }
        };
        metrics::record_outbound_latency(started.elapsed());

        tracing::debug!(status = status.as_u16(), "Coinbase responded");

        let body = parse_body(&text);
        if status.is_success() {
            DispatchOutcome::Ok {
                status: status.as_u16(),
                body,
            }
        } else {
            DispatchOutcome::HttpError {
                status: status.as_u16(),
                body,
            }
        }
    }
}

/// JSON when possible, otherwise the raw text as a JSON string.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signing::Credential;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str, timeout: Duration) -> CoinbaseHttpClient {
        CoinbaseHttpClient::new(&CoinbaseSettings {
            base_url: base_url.to_string(),
            timeout,
        })
        .unwrap()
    }

    fn bearer_request(body: Option<&str>) -> OutboundRequest {
        OutboundRequest {
            method: "POST".to_string(),
            path: "/api/v3/brokerage/orders".to_string(),
            credential: Credential::Bearer {
                token: "token".to_string(),
            },
            body: body.map(str::to_string),
        }
    }

    #[test]
    fn parse_body_variants() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_body("Bad Gateway"), json!("Bad Gateway"));
    }

    #[tokio::test]
    async fn sends_body_verbatim_with_headers() {
        let server = MockServer::start().await;
        let body = r#"{"product_id":"BTC-USD","side":"BUY"}"#;
        Mock::given(method("POST"))
            .and(path("/api/v3/brokerage/orders"))
            .and(header("authorization", "Bearer token"))
            .and(header("content-type", "application/json"))
            .and(body_string(body))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server.uri(), Duration::from_secs(5))
            .dispatch(bearer_request(Some(body)))
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::Ok {
                status: 200,
                body: json!({"success": true})
            }
        );
    }

    #[tokio::test]
    async fn non_success_status_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server.uri(), Duration::from_secs(5))
            .dispatch(bearer_request(None))
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::HttpError {
                status: 401,
                body: json!("Unauthorized")
            }
        );
    }

    #[tokio::test]
    async fn slow_response_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server.uri(), Duration::from_millis(200))
            .dispatch(bearer_request(None))
            .await;

        assert!(matches!(outcome, DispatchOutcome::TransportError { .. }));
    }

    #[tokio::test]
    async fn invalid_method_is_local_error() {
        let mut request = bearer_request(None);
        request.method = "NOT A METHOD".to_string();

        let outcome = client("http://127.0.0.1:1", Duration::from_secs(2))
            .dispatch(request)
            .await;

        assert!(matches!(outcome, DispatchOutcome::LocalError { .. }));
    }

    #[tokio::test]
    async fn unparseable_url_is_local_error() {
        let outcome = client("http://bad host", Duration::from_secs(2))
            .dispatch(bearer_request(None))
            .await;

        assert!(matches!(outcome, DispatchOutcome::LocalError { .. }));
    }

    #[tokio::test]
    async fn invalid_header_value_is_local_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut request = bearer_request(None);
        request.credential = Credential::Bearer {
            token: "line\nbreak".to_string(),
        };

        let outcome = client(&server.uri(), Duration::from_secs(2))
            .dispatch(request)
            .await;

        assert!(matches!(outcome, DispatchOutcome::LocalError { .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let outcome = client("http://127.0.0.1:1", Duration::from_secs(2))
            .dispatch(bearer_request(None))
            .await;

        assert!(matches!(outcome, DispatchOutcome::TransportError { .. }));
    }
}
