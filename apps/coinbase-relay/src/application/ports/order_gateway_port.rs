//! Order Gateway Port (Driven Port)
//!
//! Sends one signed request to the brokerage and reports what came back.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::signing::{Credential, SignedRequest};

/// A fully signed outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// HTTP method.
    pub method: String,
    /// Path appended to the gateway base URL.
    pub path: String,
    /// Headers carrying the credential.
    pub credential: Credential,
    /// Body text, sent verbatim.
    pub body: Option<String>,
}

impl From<SignedRequest> for OutboundRequest {
    fn from(signed: SignedRequest) -> Self {
        Self {
            method: signed.method,
            path: signed.path,
            credential: signed.credential,
            body: signed.body,
        }
    }
}

/// What happened to one outbound call.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// 2xx response.
    Ok {
        /// HTTP status.
        status: u16,
        /// Response body; non-JSON text is wrapped as a JSON string.
        body: Value,
    },
    /// Non-2xx response.
    HttpError {
        /// HTTP status.
        status: u16,
        /// Response body; non-JSON text is wrapped as a JSON string.
        body: Value,
    },
    /// No response: connect failure, timeout, broken stream.
    TransportError {
        /// Error text.
        cause: String,
    },
    /// The request could not be built, so nothing was sent.
    LocalError {
        /// Error text.
        cause: String,
    },
}

/// Port for delivering signed orders.
///
/// Implementations must issue exactly one attempt; retries are not allowed.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Send the request once and classify the transport result.
    async fn dispatch(&self, request: OutboundRequest) -> DispatchOutcome;
}
