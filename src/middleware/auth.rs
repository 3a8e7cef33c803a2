use std::sync::Arc;

use axum::http::HeaderMap;
use tracing::debug;

use crate::auth::{Claims, Identity, TokenCodec};
use crate::error::ApiError;
use crate::middleware::context::RequestContext;

/// Headers set by proxies that forward the original `Authorization` value.
const FORWARDED_AUTH_HEADERS: [&str; 2] = ["x-forwarded-authorization", "x-original-authorization"];

/// Header carrying a bare token, without a scheme.
const RAW_TOKEN_HEADER: &str = "x-auth-token";

/// Locates a credential on the request and verifies it.
#[derive(Debug, Clone)]
pub struct AuthGuard {
    codec: Arc<TokenCodec>,
}

impl AuthGuard {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Claims of a valid credential, or `None`. Looks at the `Authorization`
    /// header, then proxy header variants, then `?token=`, then body `_token`;
    /// the first non-empty credential found is the only one checked.
    pub fn authenticate(&self, ctx: &RequestContext) -> Option<Claims> {
        let token = locate_token(ctx)?;
        match self.codec.verify(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!("Rejected credential: {}", e);
                None
            }
        }
    }

    /// Like [`AuthGuard::authenticate`] but requires the identity claims; 401 otherwise.
    pub fn require(&self, ctx: &RequestContext) -> Result<Identity, ApiError> {
        self.authenticate(ctx)
            .as_ref()
            .and_then(Identity::from_claims)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }

    pub fn require_claims(&self, ctx: &RequestContext) -> Result<Claims, ApiError> {
        self.authenticate(ctx)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

fn locate_token(ctx: &RequestContext) -> Option<String> {
    if let Some(token) = extract_bearer(&ctx.headers, "authorization") {
        return Some(token);
    }

    for header in FORWARDED_AUTH_HEADERS {
        if let Some(token) = extract_bearer(&ctx.headers, header) {
            return Some(token);
        }
    }

    if let Some(token) = non_empty(ctx.header(RAW_TOKEN_HEADER)) {
        return Some(token);
    }

    if let Some(token) = non_empty(ctx.query_param("token")) {
        return Some(token);
    }

    non_empty(ctx.body_token().as_deref())
}

/// Token from a `Bearer <token>` header; other schemes and empty values are `None`.
pub fn extract_bearer(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    non_empty(Some(token))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
