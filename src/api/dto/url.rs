//! DTOs for short link endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::ShortLink;

/// Request to shorten a URL. Scheme and host checks happen in the link service.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ShortenRequest {
    #[validate(length(max = 2048, message = "URL is too long"))]
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub status: &'static str,
    pub message: String,
    pub shorten_url: String,
    pub original_url: String,
    pub code: String,
}

/// One owned link with its visit statistics.
#[derive(Debug, Serialize)]
pub struct LinkView {
    pub code: String,
    pub short_url: String,
    pub original_url: String,
    pub visit_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_visited_at: Option<DateTime<Utc>>,
    pub visit_history: Vec<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LinkView {
    pub fn new(link: ShortLink, short_url: String) -> Self {
        LinkView {
            visit_count: link.visit_count(),
            last_visited_at: link.last_visited_at(),
            code: link.code,
            short_url,
            original_url: link.original_url,
            visit_history: link.visit_history,
            created_at: link.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub status: &'static str,
    pub message: String,
    pub total: usize,
    pub urls: Vec<LinkView>,
}

#[derive(Debug, Serialize)]
pub struct MostRecentResponse {
    pub status: &'static str,
    pub message: String,
    pub url: Option<LinkView>,
}
