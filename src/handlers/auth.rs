use axum::response::{IntoResponse, Response};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::app::AppState;
use crate::auth::{verify_password_blocking, PasswordError};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, MessageResponse, RequestContext};
use crate::validation::{Rule, RuleSet, Validator};

static LOGIN_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new()
        .field("username", [Rule::Required, Rule::Min(3)])
        .field("password", [Rule::Required, Rule::Min(8)])
});

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// POST /auth/login
pub async fn login(state: AppState, ctx: RequestContext, _params: Vec<String>) -> Result<Response, ApiError> {
    let body = ctx.json_body()?;

    let mut validator = Validator::new();
    if !validator.validate(&body, &LOGIN_RULES) {
        return Err(ApiError::validation_failed(validator.into_errors()));
    }

    let username = body.get("username").and_then(Value::as_str).unwrap_or_default();
    let password = body.get("password").and_then(Value::as_str).unwrap_or_default();

    let Some(user) = state.store.find_user_by_username(username).await? else {
        warn!("Login failed: unknown user '{}'", username);
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    let matches = match verify_password_blocking(password.to_string(), user.password_hash.clone()).await {
        Ok(matches) => matches,
        Err(PasswordError::Bcrypt(e)) => {
            error!("Stored password hash for '{}' is unusable: {}", username, e);
            false
        }
        Err(e) => return Err(ApiError::internal(e)),
    };
    if !matches {
        warn!("Login failed: wrong password for '{}'", username);
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    if !user.is_active {
        warn!("Login refused: user '{}' is inactive", username);
        return Err(ApiError::forbidden("User account is disabled"));
    }

    let identity = user.identity();
    let token = state.tokens.issue(identity.to_claims()).map_err(ApiError::internal)?;
    info!("User '{}' logged in", identity.username);

    Ok(ApiResponse::success(json!({
        "token": token,
        "user": identity,
        "expires_in": state.tokens.ttl_seconds(),
    }))
    .with_message("Login successful")
    .into_response())
}

/// POST /auth/verify
pub async fn verify(state: AppState, ctx: RequestContext, _params: Vec<String>) -> Result<Response, ApiError> {
    let claims = state.guard.require_claims(&ctx)?;
    Ok(ApiResponse::success(claims).into_response())
}

/// GET /auth/user
pub async fn current_user(state: AppState, ctx: RequestContext, _params: Vec<String>) -> Result<Response, ApiError> {
    let identity = state.guard.require(&ctx)?;
    let profile = state
        .store
        .find_user_profile(identity.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(profile).into_response())
}

/// POST /auth/logout. Credentials are stateless, so nothing is revoked.
pub async fn logout(_state: AppState, _ctx: RequestContext, _params: Vec<String>) -> Result<Response, ApiError> {
    Ok(MessageResponse::message("Logged out successfully").into_response())
}
