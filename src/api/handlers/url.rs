//! Handlers for the authenticated short link API.

use axum::{Extension, Json, extract::State};
use validator::Validate;

use crate::api::dto::SUCCESS;
use crate::api::dto::url::{
    LinkListResponse, LinkView, MostRecentResponse, ShortenRequest, ShortenResponse,
};
use crate::api::extract::ApiJson;
use crate::api::middleware::CurrentAccount;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link owned by the caller.
///
/// # Endpoint
///
/// `POST /api/v1/url/shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/a" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "success",
///   "message": "URL shortened successfully.",
///   "shortenUrl": "http://localhost:8000/Xy3_a9Qk",
///   "originalUrl": "https://example.com/a",
///   "code": "Xy3_a9Qk"
/// }
/// ```
///
/// # Errors
///
/// - 400 if the URL is missing or not absolute http(s)
/// - 503 if no free code could be allocated
pub async fn shorten_handler(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    ApiJson(payload): ApiJson<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let shortened = state
        .link_service
        .shorten(account.id, &payload.url)
        .await?;

    Ok(Json(ShortenResponse {
        status: SUCCESS,
        message: "URL shortened successfully.".to_string(),
        shorten_url: shortened.short_url,
        original_url: shortened.link.original_url,
        code: shortened.link.code,
    }))
}

/// Lists the caller's links, newest first, with visit statistics.
///
/// # Endpoint
///
/// `GET /api/v1/url/list-urls`
pub async fn list_urls_handler(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<LinkListResponse>, AppError> {
    let links = state.link_service.list_by_owner(account.id).await?;

    let urls: Vec<LinkView> = links
        .into_iter()
        .map(|link| {
            let short_url = state.link_service.short_url(&link.code);
            LinkView::new(link, short_url)
        })
        .collect();

    Ok(Json(LinkListResponse {
        status: SUCCESS,
        message: format!("Found {} short link(s).", urls.len()),
        total: urls.len(),
        urls,
    }))
}

/// Returns the caller's newest link, or `null` if they have none.
///
/// # Endpoint
///
/// `GET /api/v1/url/most-recent`
pub async fn most_recent_handler(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<MostRecentResponse>, AppError> {
    let link = state.link_service.most_recent_by_owner(account.id).await?;

    let url = link.map(|link| {
        let short_url = state.link_service.short_url(&link.code);
        LinkView::new(link, short_url)
    });

    let message = match &url {
        Some(_) => "Most recent short link fetched.",
        None => "You have not shortened any URLs yet.",
    };

    Ok(Json(MostRecentResponse {
        status: SUCCESS,
        message: message.to_string(),
        url,
    }))
}
