//! Handlers for the authenticated account.

use axum::{Extension, Json, extract::State, response::Response};
use validator::Validate;

use crate::api::dto::SUCCESS;
use crate::api::dto::auth::{AccountResponse, AccountView, ChangePasswordRequest};
use crate::api::extract::ApiJson;
use crate::api::handlers::auth::session_response;
use crate::api::middleware::CurrentAccount;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the account behind the session.
///
/// # Endpoint
///
/// `GET /api/v1/user/get-me`
pub async fn get_me_handler(
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Json<AccountResponse> {
    let greeting = account.display_name();
    Json(AccountResponse {
        status: SUCCESS,
        message: format!("Welcome, {greeting}! Let's make your links shorter and smarter."),
        user: AccountView::from(&account),
    })
}

/// Changes the password and returns a fresh session.
///
/// Every token issued before the change stops working, including the one used for
/// this request.
///
/// # Endpoint
///
/// `POST /api/v1/user/change-password`
///
/// # Request Body
///
/// ```json
/// { "current_password": "secret1", "new_password": "secret2" }
/// ```
///
/// # Errors
///
/// - 401 if the current password is wrong
/// - 400 if the new password is too short
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let updated = state
        .auth_service
        .change_password(&account, &payload.current_password, &payload.new_password)
        .await?;

    session_response(&state, &updated, "Password changed successfully!")
}
