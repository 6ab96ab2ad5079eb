//! Handlers for registration, OTP verification, and login.

use axum::{
    Json,
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
};
use validator::Validate;

use crate::api::dto::auth::{
    AccountView, LoginRequest, RegisterRequest, ResendOtpRequest, SessionResponse,
    VerifyOtpRequest,
};
use crate::api::dto::{MessageResponse, SUCCESS};
use crate::api::extract::ApiJson;
use crate::domain::entities::Account;
use crate::error::AppError;
use crate::state::AppState;

const OTP_SENT: &str = "OTP sent successfully!";

/// Registers an account and mails its first OTP.
///
/// # Endpoint
///
/// `POST /api/v1/auth/register` (also `/api/v1/auth/signup`)
///
/// # Request Body
///
/// ```json
/// { "firstname": "Ann", "lastname": "Lee", "email": "ann@x.com", "password": "secret1" }
/// ```
///
/// # Errors
///
/// - 400 on missing first name, malformed email, or short password
/// - 409 if a verified account owns the email
/// - 502 if the OTP mail could not be sent (the account remains, resend is possible)
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;

    let account = state.auth_service.register(payload.into()).await?;
    state.auth_service.issue_otp(account.id).await?;

    Ok(Json(MessageResponse::new(OTP_SENT)))
}

/// Mails a fresh OTP, replacing any previous one.
///
/// # Endpoint
///
/// `POST /api/v1/auth/resend-otp`
///
/// # Errors
///
/// - 404 if no account has the email
/// - 409 if the account is already verified
/// - 502 if the mail could not be sent
pub async fn resend_otp_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResendOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth_service.resend_otp(&payload.email).await?;

    Ok(Json(MessageResponse::new(OTP_SENT)))
}

/// Verifies the OTP and starts a session.
///
/// # Endpoint
///
/// `POST /api/v1/auth/verify-otp`
///
/// # Response
///
/// Sets the `token` cookie and returns the same token in the body:
///
/// ```json
/// { "status": "success", "message": "OTP verification complete", "token": "...", "user": { ... } }
/// ```
///
/// # Errors
///
/// - 400 if the email is unknown or the OTP is absent or expired (one generic message)
/// - 401 if the OTP does not match
/// - 409 if the account is already verified
pub async fn verify_otp_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<VerifyOtpRequest>,
) -> Result<Response, AppError> {
    let account = state
        .auth_service
        .verify_otp(&payload.email, &payload.otp)
        .await?;

    session_response(&state, &account, "OTP verification complete")
}

/// Checks credentials and starts a session.
///
/// # Endpoint
///
/// `POST /api/v1/auth/login`
///
/// # Errors
///
/// - 400 if email or password is missing
/// - 404 if no account has the email
/// - 401 on a wrong password
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Response, AppError> {
    let account = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    session_response(&state, &account, "Logged in successfully!")
}

/// Issues a token for `account` and returns it as cookie and body.
pub(crate) fn session_response(
    state: &AppState,
    account: &Account,
    message: &str,
) -> Result<Response, AppError> {
    let token = state.session_service.issue_for(account)?;
    let cookie = state.session_service.session_cookie(&token);

    let body = SessionResponse {
        status: SUCCESS,
        message: message.to_string(),
        token,
        user: AccountView::from(account),
    };

    Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
}
