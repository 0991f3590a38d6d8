//! Canonical JSON
//!
//! Deterministic serialization used as signing input. Object keys are sorted
//! byte-wise at every nesting level and no insignificant whitespace is
//! emitted, so two values that differ only in key order always produce the
//! same bytes.

use std::collections::BTreeMap;

use serde_json::{Number, Value};

/// JSON value with object keys held in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalValue {
    /// `null`.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// Any JSON number, kept in its parsed representation.
    Number(Number),
    /// A string.
    String(String),
    /// An ordered sequence.
    Array(Vec<Self>),
    /// A mapping with keys in byte-wise order.
    Object(BTreeMap<String, Self>),
}

impl CanonicalValue {
    /// Whether this value contributes nothing to a signed body.
    ///
    /// `null`, `{}` and `[]` are all treated as an absent body.
    #[must_use]
    pub fn is_empty_body(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Array(items) => items.is_empty(),
            Self::Object(fields) => fields.is_empty(),
            Self::Bool(_) | Self::Number(_) | Self::String(_) => false,
        }
    }

    /// Serialize to canonical bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_canonical_string().into_bytes()
    }

    /// Serialize to a canonical string.
    #[must_use]
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        self.write_str(&mut out);
        out
    }

    fn write_str(&self, out: &mut String) {
        match self {
            Self::Null => out.push_str("null"),
            Self::Bool(true) => out.push_str("true"),
            Self::Bool(false) => out.push_str("false"),
            Self::Number(n) => out.push_str(&n.to_string()),
            Self::String(s) => write_json_string(s, out),
            Self::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_str(out);
                }
                out.push(']');
            }
            Self::Object(fields) => {
                out.push('{');
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_json_string(key, out);
                    out.push(':');
                    value.write_str(out);
                }
                out.push('}');
            }
        }
    }
}

impl From<&Value> for CanonicalValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from).collect()),
            Value::Object(fields) => Self::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Canonicalize a JSON value into bytes.
#[must_use]
pub fn canonicalize(value: &Value) -> Vec<u8> {
    CanonicalValue::from(value).to_bytes()
}

/// Canonical body text for signing, or `None` when the body is absent or empty.
#[must_use]
pub fn canonical_body(body: Option<&Value>) -> Option<String> {
    let canonical = CanonicalValue::from(body?);
    if canonical.is_empty_body() {
        return None;
    }
    Some(canonical.to_canonical_string())
}

/// Standard JSON string escaping, delegated to `serde_json`.
fn write_json_string(s: &str, out: &mut String) {
    // Serializing a str cannot fail.
    match serde_json::to_string(s) {
        Ok(encoded) => out.push_str(&encoded),
        Err(_) => out.push_str("\"\""),
    }
}
