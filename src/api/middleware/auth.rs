//! Session authentication middleware.

use axum::{
    Extension,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::COOKIE},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::application::services::session_service::SESSION_COOKIE;
use crate::domain::entities::Account;
use crate::{error::AppError, state::AppState};

/// The authenticated account, attached to the request by [`layer`].
///
/// Handlers behind the layer read it with `Extension<CurrentAccount>`.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

/// Authenticates requests with a session token.
///
/// # Token Sources
///
/// ```text
/// Authorization: Bearer <token>
/// Cookie: token=<token>
/// ```
///
/// The header wins when both are present.
///
/// # Errors
///
/// Returns `401 Unauthorized` with `WWW-Authenticate: Bearer` if the token is missing,
/// invalid or expired, belongs to a deleted account, or predates a password change.
///
/// # Example
///
/// ```rust,ignore
/// let protected = Router::new()
///     .route("/user/get-me", get(get_me_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let token = match AuthBearer::from_request_parts(&mut parts, &()).await {
        Ok(AuthBearer(token)) => Some(token),
        Err(_) => cookie_token(&parts.headers),
    };

    let account = st.session_service.authenticate(token.as_deref()).await?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(CurrentAccount(account));

    Ok(next.run(req).await)
}

/// Admits only accounts whose email has been verified.
///
/// Must run inside [`layer`], which attaches the [`CurrentAccount`]. Links are only ever
/// owned by verified accounts.
///
/// # Errors
///
/// Returns `403 Forbidden` for an unverified account.
///
/// # Example
///
/// ```rust,ignore
/// let url_routes = Router::new()
///     .route("/url/shorten", post(shorten_handler))
///     .route_layer(middleware::from_fn(auth::require_verified))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn require_verified(
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !account.verified {
        tracing::debug!(account_id = account.id, "Unverified account refused");
        return Err(AppError::forbidden(
            "Please verify your email before managing short links.",
            json!({}),
        ));
    }

    Ok(next.run(req).await)
}

/// Finds the session cookie among possibly several in the `Cookie` header.
fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookie_str| cookie_str.split(';'))
        .find_map(|cookie| {
            let mut parts = cookie.trim().splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(name), Some(value)) if name == SESSION_COOKIE && !value.is_empty() => {
                    Some(value.to_string())
                }
                _ => None,
            }
        })
}
