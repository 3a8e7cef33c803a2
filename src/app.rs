//! Application state and the axum service.
//!
//! API routes are not registered with axum. A single fallback builds a
//! [`RequestContext`] and resolves it through the [`RouteTable`], so path
//! matching (base prefix, trailing slash, first-registered-wins) stays in one place.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use futures::future::BoxFuture;
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error};

use crate::auth::TokenCodec;
use crate::config::AppConfig;
use crate::database::RegistryStore;
use crate::error::ApiError;
use crate::handlers;
use crate::middleware::{AuthGuard, RequestContext};
use crate::routing::{RoutePatternError, RouteTable};

pub type HandlerFuture = BoxFuture<'static, Result<Response, ApiError>>;

/// Route handler: shared state, the request, and positional path arguments.
pub type Handler = Arc<dyn Fn(AppState, RequestContext, Vec<String>) -> HandlerFuture + Send + Sync>;

/// Boxes an async fn into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(AppState, RequestContext, Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
    Arc::new(move |state, ctx, params| -> HandlerFuture { Box::pin(f(state, ctx, params)) })
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RegistryStore>,
    pub tokens: Arc<TokenCodec>,
    pub guard: AuthGuard,
    pub routes: Arc<RouteTable<Handler>>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn RegistryStore>) -> Result<Self, RoutePatternError> {
        let tokens = Arc::new(TokenCodec::new(
            config.security.jwt_secret.as_bytes(),
            config.security.jwt_expiration_secs,
        ));
        let routes = Arc::new(handlers::routes(&config.server.base_path)?);

        Ok(Self {
            config: Arc::new(config),
            store,
            guard: AuthGuard::new(tokens.clone()),
            tokens,
            routes,
        })
    }
}

pub fn build_app(state: AppState) -> Router {
    let debug = state.config.server.debug;

    Router::new()
        .route("/health", get(health))
        .fallback(dispatch)
        .with_state(state)
        // Global middleware
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
            panic_response(panic, debug)
        }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let debug = state.config.server.debug;

    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    let ctx = match RequestContext::from_request(request, state.config.server.max_request_size_bytes).await {
        Ok(ctx) => ctx,
        Err(e) => return e.into_response_with(debug),
    };

    let (route, params) = match state.routes.dispatch(&ctx.method, &ctx.path) {
        Ok(found) => (found.handler.clone(), found.params),
        Err(not_found) => return ApiError::from(not_found).into_response_with(debug),
    };

    let method = ctx.method.clone();
    let path = ctx.path.clone();
    match route(state, ctx, params).await {
        Ok(response) => response,
        Err(e) => {
            if e.status_code().is_server_error() {
                error!("{} {} failed: {} ({:?})", method, path, e.error_code(), e);
            } else {
                debug!("{} {} -> {} {}", method, path, e.status_code(), e.message());
            }
            e.into_response_with(debug)
        }
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>, debug: bool) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!("Handler panicked: {}", detail);
    ApiError::internal(detail).into_response_with(debug)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
