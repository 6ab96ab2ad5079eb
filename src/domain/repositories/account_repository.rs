//! Repository trait for account data access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{Account, NewAccount};
use crate::error::AppError;

/// Repository interface for account records.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAccountRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<(), AppError>;

    /// Inserts a new, unverified account.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if an account with the same email exists.
    async fn create(&self, new_account: NewAccount) -> Result<Account, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, AppError>;

    /// Finds an account by exact (case-sensitive) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    /// Deletes the account with `email` only if it is unverified.
    ///
    /// Returns `Ok(true)` if a record was removed.
    async fn delete_unverified(&self, email: &str) -> Result<bool, AppError>;

    /// Replaces the OTP hash and expiry of an account.
    ///
    /// Returns `Ok(None)` if no account has this id.
    async fn store_otp(
        &self,
        id: i64,
        otp_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Account>, AppError>;

    /// Sets `verified = true` and clears both OTP fields in one statement.
    ///
    /// Returns `Ok(None)` if the account does not exist or was already verified, so two
    /// concurrent verifications cannot both succeed.
    async fn mark_verified(&self, id: i64) -> Result<Option<Account>, AppError>;

    /// Replaces the password hash and stamps `password_changed_at`.
    async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<Option<Account>, AppError>;

    /// Stamps `password_changed_at` without changing the password, revoking all sessions.
    async fn invalidate_sessions(&self, id: i64, at: DateTime<Utc>) -> Result<bool, AppError>;

    /// Lists accounts, newest first.
    async fn list(&self, limit: i64) -> Result<Vec<Account>, AppError>;
}
