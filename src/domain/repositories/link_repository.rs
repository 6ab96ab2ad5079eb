//! Repository trait for short link data access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::error::AppError;

/// Repository interface for short links.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new short link with an empty visit history.
    ///
    /// The store's unique constraint on `code` is authoritative: a collision is reported
    /// as `Ok(None)` so the caller can pick another code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on any other database error.
    async fn insert(&self, new_link: NewShortLink) -> Result<Option<ShortLink>, AppError>;

    /// Atomically appends `at` to the link's visit history and returns its original URL.
    ///
    /// Returns `Ok(None)` if no link has this code. Concurrent calls on the same code each
    /// append exactly one visit.
    async fn record_visit(&self, code: &str, at: DateTime<Utc>)
    -> Result<Option<String>, AppError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError>;

    /// Lists all links owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<ShortLink>, AppError>;

    /// Returns the newest link owned by `owner_id`.
    async fn most_recent_by_owner(&self, owner_id: i64) -> Result<Option<ShortLink>, AppError>;
}
