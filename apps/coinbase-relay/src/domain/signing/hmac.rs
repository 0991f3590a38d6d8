//! HMAC-SHA256 signer for legacy API keys.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

use super::{Credential, RequestSigner, SignedRequest, SigningError, SigningRequest, SigningScheme};
use crate::domain::canonical::CanonicalValue;

type HmacSha256 = Hmac<Sha256>;

/// Signs requests with `CB-ACCESS-*` headers.
pub struct HmacSha256Signer {
    api_key: String,
    secret: String,
}

impl std::fmt::Debug for HmacSha256Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSha256Signer").finish_non_exhaustive()
    }
}

impl HmacSha256Signer {
    /// Create a signer from an API key and shared secret.
    pub fn new(api_key: &str, secret: &str) -> Result<Self, SigningError> {
        if api_key.trim().is_empty() {
            return Err(SigningError::MalformedKey("api key is empty".to_string()));
        }
        if secret.is_empty() {
            return Err(SigningError::MalformedKey("api secret is empty".to_string()));
        }

        Ok(Self {
            api_key: api_key.to_string(),
            secret: secret.to_string(),
        })
    }

    /// `timestamp ++ method ++ path ++ body`.
    #[must_use]
    pub fn prehash(timestamp: i64, method: &str, path: &str, body: Option<&str>) -> String {
        format!("{timestamp}{}", super::signed_content(method, path, body))
    }

    /// Base64 (standard, padded) HMAC-SHA256 of `prehash`.
    pub fn signature(&self, prehash: &str) -> Result<String, SigningError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| SigningError::Signing(e.to_string()))?;
        mac.update(prehash.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

fn raw_body(body: Option<&Value>) -> Result<Option<String>, SigningError> {
    match body {
        Some(value) if !CanonicalValue::from(value).is_empty_body() => serde_json::to_string(value)
            .map(Some)
            .map_err(|e| SigningError::Serialization(e.to_string())),
        _ => Ok(None),
    }
}

impl RequestSigner for HmacSha256Signer {
    fn scheme(&self) -> SigningScheme {
        SigningScheme::HmacSha256
    }

    fn sign(&self, request: &SigningRequest) -> Result<SignedRequest, SigningError> {
        let body = raw_body(request.body())?;
        let timestamp = request.issued_at();
        let prehash = Self::prehash(timestamp, request.method(), request.path(), body.as_deref());

        tracing::debug!(prehash = %prehash, "Built HMAC prehash");

        Ok(SignedRequest {
            credential: Credential::AccessKey {
                api_key: self.api_key.clone(),
                signature: self.signature(&prehash)?,
                timestamp,
            },
            method: request.method().to_string(),
            path: request.path().to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    const ORDERS_PATH: &str = "/api/v3/brokerage/orders";
    const TIMESTAMP: i64 = 1_700_000_000;

    fn signer() -> HmacSha256Signer {
        HmacSha256Signer::new("api-key", "test-secret").unwrap()
    }

    #[test]
    fn prehash_concatenates_without_separators() {
        assert_eq!(
            HmacSha256Signer::prehash(TIMESTAMP, "POST", ORDERS_PATH, Some(r#"{"a":1}"#)),
            r#"1700000000POST/api/v3/brokerage/orders{"a":1}"#
        );
    }

    #[test]
    fn signature_matches_known_vector() {
        let request = SigningRequest::new(
            "POST",
            ORDERS_PATH,
            Some(json!({"product_id": "BTC-USD", "side": "BUY"})),
            TIMESTAMP,
        );

        let signed = signer().sign(&request).unwrap();

        assert_eq!(
            signed.body.as_deref(),
            Some(r#"{"product_id":"BTC-USD","side":"BUY"}"#)
        );
        assert_eq!(
            signed.credential,
            Credential::AccessKey {
                api_key: "api-key".to_string(),
                signature: "zxqe9/X5oKyRdAJN0YdvLJjB5nxWuvrR1XBwdlnGzp8=".to_string(),
                timestamp: TIMESTAMP,
            }
        );
    }

    #[test_case(None ; "absent body")]
    #[test_case(Some(json!({})) ; "empty object")]
    #[test_case(Some(json!(null)) ; "null body")]
    fn empty_body_signs_without_body(body: Option<Value>) {
        let request = SigningRequest::new("POST", ORDERS_PATH, body, TIMESTAMP);

        let signed = signer().sign(&request).unwrap();

        assert!(signed.body.is_none());
        let Credential::AccessKey { signature, .. } = signed.credential else {
            panic!("expected access key credential");
        };
        assert_eq!(signature, "Pi8d9EQo8knt+YmRog3JwDXXpSDbbiGGtQbf+8c/C/M=");
    }

    #[test]
    fn timestamp_header_is_decimal_seconds() {
        let request = SigningRequest::new("POST", ORDERS_PATH, None, TIMESTAMP);
        let headers = signer().sign(&request).unwrap().credential.headers();
        assert_eq!(headers[2], ("CB-ACCESS-TIMESTAMP", "1700000000".to_string()));
    }

    #[test_case("", "secret" ; "empty key")]
    #[test_case("key", "" ; "empty secret")]
    fn empty_credentials_are_rejected(api_key: &str, secret: &str) {
        let err = HmacSha256Signer::new(api_key, secret).unwrap_err();
        assert!(err.is_configuration());
    }
}
