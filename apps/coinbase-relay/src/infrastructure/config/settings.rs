//! Relay Configuration Settings
//!
//! Configuration types for the relay, loaded from environment variables.
//! Values can also be read through an arbitrary lookup function, which is
//! how the tests build configurations without touching the process env.

use std::time::Duration;

use crate::domain::signing::{
    JwtOptions, JwtSubject, KeyMaterial, MAX_TTL_SECS, MIN_TTL_SECS, SigningScheme,
};

/// Default brokerage base URL.
pub const DEFAULT_COINBASE_BASE_URL: &str = "https://api.coinbase.com";

/// Coinbase REST client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinbaseSettings {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Whole-request timeout for the outbound call.
    pub timeout: Duration,
}

impl Default for CoinbaseSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COINBASE_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Inbound HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Listen port on all interfaces.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Complete relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Signing scheme.
    pub scheme: SigningScheme,
    /// Key material for `scheme`, if fully configured.
    pub key_material: Option<KeyMaterial>,
    /// JWT claim settings (ignored for HMAC).
    pub jwt: JwtOptions,
    /// Outbound client settings.
    pub coinbase: CoinbaseSettings,
    /// Inbound server settings.
    pub server: ServerSettings,
}

impl RelayConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but invalid. Missing key
    /// material is not an error; see [`RelayConfig::missing_credentials`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from a key lookup function.
    ///
    /// # Errors
    ///
    /// Same as [`RelayConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let scheme = match get("SIGNING_SCHEME") {
            Some(raw) => SigningScheme::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "SIGNING_SCHEME",
                value: raw,
                expected: "jwt, es256 or hmac",
            })?,
            None => SigningScheme::default(),
        };

        let subject = match get("JWT_SUBJECT") {
            Some(raw) => JwtSubject::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "JWT_SUBJECT",
                value: raw,
                expected: "request-hash or key-id",
            })?,
            None => JwtSubject::default(),
        };

        let ttl_secs = parse_number(&get, "JWT_TTL_SECS", MIN_TTL_SECS)?;
        if !(MIN_TTL_SECS..=MAX_TTL_SECS).contains(&ttl_secs) {
            return Err(ConfigError::OutOfRange {
                key: "JWT_TTL_SECS",
                value: ttl_secs,
                min: MIN_TTL_SECS,
                max: MAX_TTL_SECS,
            });
        }

        let timeout_secs = parse_number(&get, "OUTBOUND_TIMEOUT_SECS", 30)?;
        if !(1..ttl_secs).contains(&timeout_secs) {
            return Err(ConfigError::OutOfRange {
                key: "OUTBOUND_TIMEOUT_SECS",
                value: timeout_secs,
                min: 1,
                max: ttl_secs - 1,
            });
        }

        let base_url = get("COINBASE_API_BASE_URL").map_or_else(
            || DEFAULT_COINBASE_BASE_URL.to_string(),
            |v| v.trim().trim_end_matches('/').to_string(),
        );
        let is_http_url = reqwest::Url::parse(&base_url)
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some());
        if !is_http_url {
            return Err(ConfigError::InvalidValue {
                key: "COINBASE_API_BASE_URL",
                value: base_url,
                expected: "an http:// or https:// URL",
            });
        }

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: raw,
                expected: "a TCP port number",
            })?,
            None => ServerSettings::default().port,
        };

        let key_material = match scheme {
            SigningScheme::JwtEs256 => get("API_KEY_ID").zip(get("PRIVATE_KEY")).map(
                |(key_id, pem)| KeyMaterial::Es256 {
                    key_id: key_id.trim().to_string(),
                    private_key_pem: normalize_pem(&pem),
                },
            ),
            SigningScheme::HmacSha256 => {
                get("API_KEY")
                    .zip(get("API_SECRET"))
                    .map(|(api_key, secret)| KeyMaterial::Hmac {
                        api_key: api_key.trim().to_string(),
                        secret,
                    })
            }
        };

        Ok(Self {
            scheme,
            key_material,
            jwt: JwtOptions { subject, ttl_secs },
            coinbase: CoinbaseSettings {
                base_url,
                timeout: Duration::from_secs(timeout_secs.unsigned_abs()),
            },
            server: ServerSettings { port },
        })
    }

    /// Environment variables required by the selected scheme.
    #[must_use]
    pub const fn credential_vars(&self) -> [&'static str; 2] {
        match self.scheme {
            SigningScheme::JwtEs256 => ["API_KEY_ID", "PRIVATE_KEY"],
            SigningScheme::HmacSha256 => ["API_KEY", "API_SECRET"],
        }
    }

    /// Credential variables that are absent, empty if key material loaded.
    #[must_use]
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        if self.key_material.is_some() {
            return Vec::new();
        }
        self.credential_vars().to_vec()
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable present but not parseable.
    #[error("environment variable {key}={value:?} is invalid, expected {expected}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
        /// What would have been accepted.
        expected: &'static str,
    },
    /// Numeric variable outside its window.
    #[error("environment variable {key}={value} must be within {min}..={max}")]
    OutOfRange {
        /// Variable name.
        key: &'static str,
        /// Parsed value.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },
}

fn parse_number<G>(get: &G, key: &'static str, default: i64) -> Result<i64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(key).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw,
            expected: "an integer number of seconds",
        })
    })
}

/// Env files often carry PEM keys on one line with literal `\n` escapes.
fn normalize_pem(pem: &str) -> String {
    pem.trim().replace("\\n", "\n")
}
