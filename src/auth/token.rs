//! Compact signed credentials: `header.payload.signature`, each segment URL-safe
//! base64 without padding, signed with HMAC-SHA256.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{Map, Value};
use sha2::Sha256;
use thiserror::Error;

/// Claim name to value. Always carries `iat` and `exp` once issued.
pub type Claims = Map<String, Value>;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    MalformedToken,

    #[error("token signature mismatch")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("token secret not configured")]
    InvalidSecret,

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Issues and verifies credentials with a single shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
    ttl_seconds: i64,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>, ttl_seconds: i64) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl_seconds,
        }
    }

    /// Default lifetime applied by [`TokenCodec::issue`].
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    pub fn issue(&self, claims: Claims) -> Result<String, TokenError> {
        self.issue_with_ttl(claims, self.ttl_seconds)
    }

    pub fn issue_with_ttl(&self, claims: Claims, ttl_seconds: i64) -> Result<String, TokenError> {
        self.issue_at(claims, ttl_seconds, Utc::now().timestamp())
    }

    /// Merges `iat = now` and `exp = now + ttl` over the caller's claims and signs the result.
    pub fn issue_at(&self, mut claims: Claims, ttl_seconds: i64, now: i64) -> Result<String, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        let exp = now
            .checked_add(ttl_seconds)
            .ok_or_else(|| TokenError::Encoding(format!("lifetime of {}s overflows exp", ttl_seconds)))?;

        claims.insert("iat".to_string(), Value::from(now));
        claims.insert("exp".to_string(), Value::from(exp));

        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Full check: segment shape, signature (constant time over the decoded bytes),
    /// header algorithm, then `exp > now`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let [header, payload, signature] =
            split_segments(token).ok_or(TokenError::MalformedToken)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::BadSignature)?;

        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let header = decode_segment(header).ok_or(TokenError::MalformedToken)?;
        if header.get("alg").and_then(Value::as_str) != Some(ALGORITHM) {
            return Err(TokenError::MalformedToken);
        }

        let claims = decode_segment(payload).ok_or(TokenError::MalformedToken)?;
        let exp = claims
            .get("exp")
            .and_then(as_timestamp)
            .ok_or(TokenError::MalformedToken)?;

        if exp <= now {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Reads the payload without checking signature or expiry.
    /// Never use the result for access decisions.
    pub fn decode(token: &str) -> Option<Claims> {
        let [_, payload, _] = split_segments(token)?;
        decode_segment(payload)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }
        HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::InvalidSecret)
    }
}

fn split_segments(token: &str) -> Option<[&str; 3]> {
    let mut parts = token.split('.');
    let segments = [parts.next()?, parts.next()?, parts.next()?];
    if parts.next().is_some() || segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments)
}

fn decode_segment(segment: &str) -> Option<Map<String, Value>> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn as_timestamp(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
}
