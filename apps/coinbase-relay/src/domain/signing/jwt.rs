//! ES256 JWT signer.
//!
//! Token layout: `b64url(header).b64url(claims).b64url(r || s)` with
//! header `{"alg":"ES256","typ":"JWT"}`. Signatures use RFC 6979
//! deterministic nonces, so identical inputs yield identical tokens.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use p256::SecretKey;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::DecodePrivateKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Credential, RequestSigner, SignedRequest, SigningError, SigningRequest, SigningScheme};
use crate::domain::canonical::canonical_body;

/// Audience expected by the brokerage.
pub const AUDIENCE: &str = "coinbase";

/// Shortest accepted token lifetime.
pub const MIN_TTL_SECS: i64 = 60;

/// Longest accepted token lifetime.
pub const MAX_TTL_SECS: i64 = 180;

/// What the `sub` claim carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JwtSubject {
    /// Hex SHA-256 of `method ++ path ++ canonical_body`.
    #[default]
    RequestHash,
    /// The API key id.
    KeyId,
}

impl JwtSubject {
    /// Parse `request-hash` / `hash` or `key-id` / `key`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "request-hash" | "request_hash" | "hash" => Some(Self::RequestHash),
            "key-id" | "key_id" | "key" => Some(Self::KeyId),
            _ => None,
        }
    }
}

/// Per-deployment JWT settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JwtOptions {
    /// `sub` claim mode.
    pub subject: JwtSubject,
    /// `exp - nbf`, within `MIN_TTL_SECS..=MAX_TTL_SECS`.
    pub ttl_secs: i64,
}

impl Default for JwtOptions {
    fn default() -> Self {
        Self {
            subject: JwtSubject::default(),
            ttl_secs: MIN_TTL_SECS,
        }
    }
}

#[derive(Serialize)]
struct JwtHeader {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: JwtHeader = JwtHeader {
    alg: "ES256",
    typ: "JWT",
};

/// Registered claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Always [`AUDIENCE`].
    pub aud: String,
    /// API key id.
    pub iss: String,
    /// Request hash or key id.
    pub sub: String,
    /// Not before, unix seconds.
    pub nbf: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Signs requests with a short-lived ES256 bearer token.
pub struct JwtEs256Signer {
    key_id: String,
    signing_key: SigningKey,
    options: JwtOptions,
}

impl std::fmt::Debug for JwtEs256Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEs256Signer")
            .field("key_id", &self.key_id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl JwtEs256Signer {
    /// Load a signer from a SEC1 (`EC PRIVATE KEY`) or PKCS#8 (`PRIVATE KEY`) PEM.
    pub fn from_pem(key_id: &str, pem: &str, options: JwtOptions) -> Result<Self, SigningError> {
        if key_id.trim().is_empty() {
            return Err(SigningError::MalformedKey("key id is empty".to_string()));
        }
        if !(MIN_TTL_SECS..=MAX_TTL_SECS).contains(&options.ttl_secs) {
            return Err(SigningError::MalformedKey(format!(
                "token lifetime {}s outside {MIN_TTL_SECS}..={MAX_TTL_SECS}s",
                options.ttl_secs
            )));
        }

        Ok(Self {
            key_id: key_id.to_string(),
            signing_key: parse_private_key(pem)?,
            options,
        })
    }

    /// Public half of the signing key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key().to_owned()
    }

    /// Claims for `request` given the body text that will be sent.
    #[must_use]
    pub fn claims(&self, request: &SigningRequest, body: Option<&str>) -> JwtClaims {
        let sub = match self.options.subject {
            JwtSubject::RequestHash => request_hash(request.method(), request.path(), body),
            JwtSubject::KeyId => self.key_id.clone(),
        };
        let nbf = request.issued_at();

        JwtClaims {
            aud: AUDIENCE.to_string(),
            iss: self.key_id.clone(),
            sub,
            nbf,
            exp: nbf + self.options.ttl_secs,
        }
    }

    fn encode(&self, claims: &JwtClaims) -> Result<String, SigningError> {
        let header = serde_json::to_vec(&HEADER)
            .map_err(|e| SigningError::Serialization(e.to_string()))?;
        let payload =
            serde_json::to_vec(claims).map_err(|e| SigningError::Serialization(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let signature: Signature = self
            .signing_key
            .try_sign(signing_input.as_bytes())
            .map_err(|e| SigningError::Signing(e.to_string()))?;

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }
}

impl RequestSigner for JwtEs256Signer {
    fn scheme(&self) -> SigningScheme {
        SigningScheme::JwtEs256
    }

    fn sign(&self, request: &SigningRequest) -> Result<SignedRequest, SigningError> {
        let body = canonical_body(request.body());
        let claims = self.claims(request, body.as_deref());

        tracing::debug!(
            content = %super::signed_content(request.method(), request.path(), body.as_deref()),
            sub = %claims.sub,
            nbf = claims.nbf,
            exp = claims.exp,
            "Built JWT claims"
        );

        Ok(SignedRequest {
            credential: Credential::Bearer {
                token: self.encode(&claims)?,
            },
            method: request.method().to_string(),
            path: request.path().to_string(),
            body,
        })
    }
}

/// Hex SHA-256 of `method ++ path ++ body`.
#[must_use]
pub fn request_hash(method: &str, path: &str, body: Option<&str>) -> String {
    let content = super::signed_content(method, path, body);
    hex::encode(Sha256::digest(content.as_bytes()))
}

fn parse_private_key(pem: &str) -> Result<SigningKey, SigningError> {
    let pem = pem.trim();
    if !pem.starts_with("-----BEGIN") || !pem.contains('\n') {
        return Err(SigningError::MalformedKey(
            "private key must be PEM text with BEGIN/END lines and line breaks".to_string(),
        ));
    }

    let secret = if pem.contains("BEGIN EC PRIVATE KEY") {
        SecretKey::from_sec1_pem(pem)
            .map_err(|e| SigningError::MalformedKey(format!("invalid SEC1 P-256 key: {e}")))?
    } else {
        SecretKey::from_pkcs8_pem(pem)
            .map_err(|e| SigningError::MalformedKey(format!("invalid PKCS#8 P-256 key: {e}")))?
    };

    Ok(SigningKey::from(secret))
}
