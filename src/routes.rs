//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`          - Short link redirect (public)
//! - `GET  /health`          - Health check (public)
//! - `/api/v1/auth/*`        - Registration, OTP, login (public)
//! - `/api/v1/user/*`        - Account endpoints (session required)
//! - `/api/v1/url/*`         - Short link API (verified session required, rate limited)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Panic capture** - Handler panics become a 500 JSON error
//! - **CORS** - Only when a frontend origin is configured
//! - **Rate limiting** - Per-IP token bucket on the short link API
//! - **Authentication** - Bearer header or `token` cookie
//! - **Path normalization** - Trailing slash handling

use std::any::Any;

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::error::AppError;
use crate::state::AppState;
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Router, middleware};
use serde_json::json;
use tower::Layer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `cors_origin` - frontend origin allowed to call the API with credentials; no CORS
///   layer is installed when `None`
pub fn app_router(state: AppState, cors_origin: Option<HeaderValue>) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state, cors_origin))
}

/// The router without path normalization.
///
/// Requests must carry `ConnectInfo<SocketAddr>`; the rate limiter keys on it.
pub fn build_router(state: AppState, cors_origin: Option<HeaderValue>) -> Router {
    let user_router = api::routes::user_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::layer,
    ));

    let url_router = api::routes::url_routes()
        .route_layer(middleware::from_fn(auth::require_verified))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer))
        .layer(rate_limit::layer());

    let api_router = Router::new()
        .nest("/auth", api::routes::auth_routes())
        .nest("/user", user_router)
        .nest("/url", url_router);

    let router = Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api/v1", api_router)
        .with_state(state);

    let router = match cors_origin {
        Some(origin) => router.layer(cors_layer(origin)),
        None => router,
    };

    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(tracing::layer())
}

fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    ::tracing::error!("Handler panicked");
    AppError::internal("Internal server error", json!({})).into_response()
}
