//! Short link creation, resolution, and listing.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::{generate_code, is_well_formed};
use crate::utils::url_check::check_target_url;

/// Attempts at inserting a freshly generated code before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 5;

/// A newly created link together with its public URL.
#[derive(Debug, Clone)]
pub struct ShortenedLink {
    pub link: ShortLink,
    pub short_url: String,
}

/// Service for creating and resolving short links.
///
/// Codes are random and inserted optimistically: the unique constraint on `code` is the
/// only collision check, and a collision just means another draw.
pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    base_url: String,
}

impl LinkService {
    pub fn new(links: Arc<dyn LinkRepository>, base_url: impl Into<String>) -> Self {
        Self {
            links,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Public URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    /// Creates a short link owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if the URL is missing or not absolute http(s)
    /// - [`AppError::ServiceUnavailable`] if every attempt collided
    pub async fn shorten(
        &self,
        owner_id: i64,
        original_url: &str,
    ) -> Result<ShortenedLink, AppError> {
        let original_url = check_target_url(original_url)?;

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_code()?;
            let inserted = self
                .links
                .insert(NewShortLink {
                    code: code.clone(),
                    owner_id,
                    original_url: original_url.clone(),
                })
                .await?;

            if let Some(link) = inserted {
                metrics::counter!("links_created_total").increment(1);
                tracing::info!(owner_id, code = %link.code, "Short link created");
                let short_url = self.short_url(&link.code);
                return Ok(ShortenedLink { link, short_url });
            }

            tracing::warn!(attempt, code = %code, "Short code collision, retrying");
        }

        tracing::error!(owner_id, "Exhausted short code attempts");
        Err(AppError::service_unavailable(
            "Could not allocate a short code, please retry",
            json!({ "attempts": MAX_CODE_ATTEMPTS }),
        ))
    }

    /// Returns the original URL for `code` and records the visit in the same statement.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this code.
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        if !is_well_formed(code) {
            return Err(invalid_code(code));
        }

        let url = self
            .links
            .record_visit(code, Utc::now())
            .await?
            .ok_or_else(|| invalid_code(code))?;

        metrics::counter!("link_visits_total").increment(1);
        tracing::debug!(code = %code, "Visit recorded");

        Ok(url)
    }

    /// Links owned by `owner_id`, newest first.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<ShortLink>, AppError> {
        self.links.list_by_owner(owner_id).await
    }

    pub async fn most_recent_by_owner(&self, owner_id: i64) -> Result<Option<ShortLink>, AppError> {
        self.links.most_recent_by_owner(owner_id).await
    }
}

fn invalid_code(code: &str) -> AppError {
    AppError::not_found("Invalid URL!!", json!({ "code": code }))
}
