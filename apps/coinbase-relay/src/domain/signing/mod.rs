//! Request Signing
//!
//! Builds the credential that authenticates one outbound brokerage call.
//!
//! Two schemes are supported:
//!
//! - **ES256 JWT**: a short-lived bearer token whose `sub` claim is the
//!   SHA-256 of `method ++ path ++ canonical_body` (or the key id, depending
//!   on deployment).
//! - **HMAC-SHA256**: `CB-ACCESS-*` headers carrying
//!   `Base64(HMAC(secret, timestamp ++ method ++ path ++ body))`.
//!
//! Whatever the scheme, a signer returns a [`SignedRequest`] that owns the
//! exact body text it signed. The transport sends that text verbatim.

mod hmac;
mod jwt;

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;

pub use self::hmac::HmacSha256Signer;
pub use self::jwt::{JwtClaims, JwtEs256Signer, JwtOptions, JwtSubject, MAX_TTL_SECS, MIN_TTL_SECS};

// =============================================================================
// Scheme
// =============================================================================

/// Which credential-construction algorithm runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigningScheme {
    /// ECDSA P-256 signed JWT bearer token.
    #[default]
    JwtEs256,
    /// HMAC-SHA256 request signature headers.
    HmacSha256,
}

impl SigningScheme {
    /// Parse a scheme name. Accepts `jwt`, `es256`, `hmac` and the full names.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "jwt" | "es256" | "jwt-es256" | "jwt_es256" => Some(Self::JwtEs256),
            "hmac" | "hmac-sha256" | "hmac_sha256" => Some(Self::HmacSha256),
            _ => None,
        }
    }

    /// Stable name used in logs and health output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::JwtEs256 => "jwt-es256",
            Self::HmacSha256 => "hmac-sha256",
        }
    }
}

impl fmt::Display for SigningScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Request / Credential
// =============================================================================

/// The method, path and body of one outbound call, plus its issue time.
#[derive(Debug, Clone, PartialEq)]
pub struct SigningRequest {
    method: String,
    path: String,
    body: Option<Value>,
    issued_at: i64,
}

impl SigningRequest {
    /// Create a request with an explicit issue time (unix seconds).
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        body: Option<Value>,
        issued_at: i64,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body,
            issued_at,
        }
    }

    /// Create a request issued at the current wall-clock second.
    #[must_use]
    pub fn issued_now(method: impl Into<String>, path: impl Into<String>, body: Option<Value>) -> Self {
        Self::new(method, path, body, Utc::now().timestamp())
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path without scheme or host.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Body to be sent, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Issue time in unix seconds.
    #[must_use]
    pub const fn issued_at(&self) -> i64 {
        self.issued_at
    }
}

/// Authentication material for one outbound call.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Bearer <token>`.
    Bearer {
        /// Compact JWS.
        token: String,
    },
    /// `CB-ACCESS-KEY` / `CB-ACCESS-SIGN` / `CB-ACCESS-TIMESTAMP`.
    AccessKey {
        /// Raw API key.
        api_key: String,
        /// Base64 HMAC signature.
        signature: String,
        /// Unix seconds that were signed.
        timestamp: i64,
    },
}

impl Credential {
    /// Header name/value pairs that carry this credential.
    #[must_use]
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Bearer { token } => vec![("Authorization", format!("Bearer {token}"))],
            Self::AccessKey {
                api_key,
                signature,
                timestamp,
            } => vec![
                ("CB-ACCESS-KEY", api_key.clone()),
                ("CB-ACCESS-SIGN", signature.clone()),
                ("CB-ACCESS-TIMESTAMP", timestamp.to_string()),
            ],
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"[REDACTED]")
                .finish(),
            Self::AccessKey { timestamp, .. } => f
                .debug_struct("AccessKey")
                .field("api_key", &"[REDACTED]")
                .field("signature", &"[REDACTED]")
                .field("timestamp", timestamp)
                .finish(),
        }
    }
}

/// A credential bound to the exact method, path and body text it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Credential to attach as headers.
    pub credential: Credential,
    /// HTTP method that was signed.
    pub method: String,
    /// Path that was signed.
    pub path: String,
    /// Body text that was signed; send it byte for byte.
    pub body: Option<String>,
}

// =============================================================================
// Key Material
// =============================================================================

/// Secrets used to sign requests, loaded once at start-up.
#[derive(Clone)]
pub enum KeyMaterial {
    /// CDP API key name and its PEM-encoded P-256 private key.
    Es256 {
        /// Key id, used as `iss`.
        key_id: String,
        /// PEM text with real line breaks.
        private_key_pem: String,
    },
    /// Legacy API key and shared secret.
    Hmac {
        /// API key sent in `CB-ACCESS-KEY`.
        api_key: String,
        /// Shared HMAC secret.
        secret: String,
    },
}

impl KeyMaterial {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Es256 { .. } => "es256",
            Self::Hmac { .. } => "hmac",
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Es256 { key_id, .. } => f
                .debug_struct("Es256")
                .field("key_id", key_id)
                .field("private_key_pem", &"[REDACTED]")
                .finish(),
            Self::Hmac { .. } => f
                .debug_struct("Hmac")
                .field("api_key", &"[REDACTED]")
                .field("secret", &"[REDACTED]")
                .finish(),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while building a credential.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SigningError {
    /// No key material was configured.
    #[error("no key material configured for {0}")]
    MissingKeyMaterial(SigningScheme),

    /// Key material does not belong to the selected scheme.
    #[error("{scheme} signing requires matching key material, got {provided} credentials")]
    KeyMismatch {
        /// Selected scheme.
        scheme: SigningScheme,
        /// Kind of key material supplied.
        provided: &'static str,
    },

    /// Key material is present but unusable.
    #[error("malformed key material: {0}")]
    MalformedKey(String),

    /// Body or claims could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The signing primitive failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl SigningError {
    /// Whether this error is caused by configuration rather than the request.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingKeyMaterial(_) | Self::KeyMismatch { .. } | Self::MalformedKey(_)
        )
    }
}

// =============================================================================
// Signer
// =============================================================================

/// Signs outbound requests.
///
/// Implementations are sync and stateless per call; signing is CPU-bound.
pub trait RequestSigner: Send + Sync {
    /// Scheme implemented by this signer.
    fn scheme(&self) -> SigningScheme;

    /// Build the credential and bind it to the body text that will be sent.
    fn sign(&self, request: &SigningRequest) -> Result<SignedRequest, SigningError>;
}

/// `method ++ path ++ body`, the content both schemes authenticate.
#[must_use]
pub fn signed_content(method: &str, path: &str, body: Option<&str>) -> String {
    let body = body.unwrap_or_default();
    let mut content = String::with_capacity(method.len() + path.len() + body.len());
    content.push_str(method);
    content.push_str(path);
    content.push_str(body);
    content
}

/// Build a signer for `scheme` from the configured key material.
pub fn build_signer(
    scheme: SigningScheme,
    key: Option<&KeyMaterial>,
    jwt_options: JwtOptions,
) -> Result<Arc<dyn RequestSigner>, SigningError> {
    let key = key.ok_or(SigningError::MissingKeyMaterial(scheme))?;

    match (scheme, key) {
        (
            SigningScheme::JwtEs256,
            KeyMaterial::Es256 {
                key_id,
                private_key_pem,
            },
        ) => Ok(Arc::new(JwtEs256Signer::from_pem(
            key_id,
            private_key_pem,
            jwt_options,
        )?)),
        (SigningScheme::HmacSha256, KeyMaterial::Hmac { api_key, secret }) => {
            Ok(Arc::new(HmacSha256Signer::new(api_key, secret)?))
        }
        (scheme, other) => Err(SigningError::KeyMismatch {
            scheme,
            provided: other.kind(),
        }),
    }
}

/// Sign one request with default JWT options and return only the credential.
pub fn sign(
    scheme: SigningScheme,
    request: &SigningRequest,
    secret: Option<&KeyMaterial>,
) -> Result<Credential, SigningError> {
    let signer = build_signer(scheme, secret, JwtOptions::default())?;
    Ok(signer.sign(request)?.credential)
}
