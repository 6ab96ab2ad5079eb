//! API route configuration.
//!
//! Everything here is mounted under `/api/v1`. Account and link routes require a
//! session via [`crate::api::middleware::auth`].

use crate::api::handlers::{
    change_password_handler, get_me_handler, list_urls_handler, login_handler,
    most_recent_handler, register_handler, resend_otp_handler, shorten_handler,
    verify_otp_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Public authentication routes.
///
/// # Endpoints
///
/// - `POST /auth/register`    - Create an account and mail an OTP (`/auth/signup` is an alias)
/// - `POST /auth/resend-otp`  - Mail a fresh OTP
/// - `POST /auth/verify-otp`  - Verify the OTP and start a session
/// - `POST /auth/login`       - Start a session with email and password
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/signup", post(register_handler))
        .route("/resend-otp", post(resend_otp_handler))
        .route("/verify-otp", post(verify_otp_handler))
        .route("/login", post(login_handler))
}

/// Account routes, session required.
///
/// # Endpoints
///
/// - `GET  /user/get-me`          - The authenticated account
/// - `POST /user/change-password` - Change password and receive a fresh session
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/get-me", get(get_me_handler))
        .route("/change-password", post(change_password_handler))
}

/// Short link routes, verified session required and rate limited per client IP.
///
/// # Endpoints
///
/// - `POST /url/shorten`     - Create a short link
/// - `GET  /url/list-urls`   - All of the caller's links, newest first
/// - `GET  /url/most-recent` - The caller's newest link
pub fn url_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/list-urls", get(list_urls_handler))
        .route("/most-recent", get(most_recent_handler))
}
