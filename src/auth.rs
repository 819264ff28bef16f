use std::collections::{BTreeMap, HashMap};

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

use crate::error::AuthError;
use crate::router::Method;

type HmacSha256 = Hmac<Sha256>;

/// Request fields that take part in the signature. Everything else is
/// ignored by both sides.
const SIGNED_FIELDS: [&str; 5] = ["title", "content", "tags", "time", "limit"];

/// Maximum accepted age of the client-supplied `time` field, in seconds.
/// There is no upper bound on future timestamps.
pub const MAX_AGE_SECS: i64 = 600;

/// Verifies the HMAC-SHA256 signature carried out-of-band with a request.
/// The signing string concatenates the HTTP method, the normalized route
/// and the canonical JSON of the allow-listed fields; the signature is
/// its lowercase hex HMAC under the shared secret.
pub struct AuthGuard {
    secret: String,
}

impl AuthGuard {
    pub fn new(secret: impl Into<String>) -> AuthGuard {
        AuthGuard { secret: secret.into() }
    }

    /// Checks freshness and signature for a request observed at `now`
    /// (unix seconds). Any failure rejects the request before routing.
    pub fn verify(
        &self,
        method: Method,
        route: &str,
        fields: &HashMap<String, String>,
        provided: Option<&str>,
        now: i64,
    ) -> Result<(), AuthError> {
        let time = fields
            .get("time")
            .and_then(|t| t.parse::<i64>().ok())
            .ok_or(AuthError::StaleTimestamp)?;
        if time < now - MAX_AGE_SECS {
            return Err(AuthError::StaleTimestamp);
        }

        let expected = self.signature(method, route, fields);
        match provided {
            None => Err(AuthError::MissingSignature),
            Some(signature) if signature != expected => Err(AuthError::SignatureMismatch),
            Some(_) => Ok(()),
        }
    }

    /// The signature a well-behaved client computes for these request
    /// parts. Exposed so clients and tests share one implementation.
    pub fn signature(&self, method: Method, route: &str, fields: &HashMap<String, String>) -> String {
        let to_sign = signing_string(method, route, fields);
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).unwrap();
        mac.update(to_sign.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn signing_string(method: Method, route: &str, fields: &HashMap<String, String>) -> String {
    format!("{}{}{}", method.as_str(), route, canonical_fields(fields))
}

/// Compact JSON of the allow-listed fields: numeric-looking values coerced
/// to integers, keys sorted. serde_json leaves slashes and non-ASCII text
/// unescaped, which is exactly the canonical form clients sign.
fn canonical_fields(fields: &HashMap<String, String>) -> String {
    let mut canonical: BTreeMap<&str, Value> = BTreeMap::new();
    for key in SIGNED_FIELDS {
        if let Some(value) = fields.get(key) {
            canonical.insert(key, coerce_numeric(value));
        }
    }
    serde_json::to_string(&canonical).unwrap()
}

fn coerce_numeric(value: &str) -> Value {
    if let Ok(int) = value.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = value.parse::<f64>() {
        if float.is_finite() {
            return Value::from(float as i64);
        }
    }
    Value::from(value)
}
