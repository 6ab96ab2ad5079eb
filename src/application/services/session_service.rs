//! Session issue and authentication gate.

use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::application::services::token_service::{TokenService, TokenStatus, is_still_valid};
use crate::domain::entities::Account;
use crate::domain::repositories::AccountRepository;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "token";

const LOGIN_REQUIRED: &str = "You are not logged in! Please log in to get access.";
const ACCOUNT_GONE: &str = "The user belonging to this token does no longer exist.";
const PASSWORD_CHANGED: &str = "User recently changed password! Please log in again.";

/// Turns presented tokens into accounts and mints new sessions.
pub struct SessionService {
    accounts: Arc<dyn AccountRepository>,
    tokens: TokenService,
    cookie_secure: bool,
}

impl SessionService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        tokens: TokenService,
        cookie_secure: bool,
    ) -> Self {
        Self {
            accounts,
            tokens,
            cookie_secure,
        }
    }

    /// Issues a session token for `account`.
    ///
    /// Tokens carry whole milliseconds. The issue time is rounded up past
    /// `password_changed_at` when both fall in the same millisecond, so a token handed
    /// out right after a password change is honored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if signing fails.
    pub fn issue_for(&self, account: &Account) -> Result<String, AppError> {
        let now = Utc::now();
        let mut issued_ms = now.timestamp_millis();
        if let Some(changed_at) = account.password_changed_at {
            issued_ms = issued_ms.max(changed_at.timestamp_millis() + 1);
        }
        let issued_at = Utc.timestamp_millis_opt(issued_ms).single().unwrap_or(now);

        self.tokens.issue_at(account.id, issued_at)
    }

    /// Resolves the account behind a presented token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is absent or invalid, the account
    /// no longer exists, or the password changed after the token was issued.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Account, AppError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized(LOGIN_REQUIRED, json!({})))?;

        let (account_id, issued_at) = match self.tokens.verify(token) {
            TokenStatus::Valid {
                account_id,
                issued_at,
            } => (account_id, issued_at),
            TokenStatus::Invalid => {
                return Err(AppError::unauthorized(
                    "Invalid or expired token",
                    json!({}),
                ));
            }
        };

        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::unauthorized(ACCOUNT_GONE, json!({})))?;

        if !is_still_valid(issued_at, &account) {
            tracing::debug!(account_id, "Token predates password change");
            return Err(AppError::unauthorized(PASSWORD_CHANGED, json!({})));
        }

        Ok(account)
    }

    /// `Set-Cookie` value carrying a session token.
    pub fn session_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
            self.tokens.lifetime().num_seconds()
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::account::sample_account;
    use crate::domain::repositories::MockAccountRepository;
    use chrono::Duration;

    const WEEK: i64 = 7 * 24 * 3600;

    fn service_with(repo: MockAccountRepository, secure: bool) -> SessionService {
        SessionService::new(Arc::new(repo), TokenService::new("secret", WEEK), secure)
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_id()
            .withf(|id| *id == 7)
            .times(1)
            .returning(|id| Ok(Some(sample_account(id, "ann@x.com"))));

        let service = service_with(repo, true);
        let token = service.issue_for(&sample_account(7, "ann@x.com")).unwrap();

        let account = service.authenticate(Some(&token)).await.unwrap();
        assert_eq!(account.id, 7);
    }

    #[tokio::test]
    async fn test_authenticate_missing_token() {
        let service = service_with(MockAccountRepository::new(), true);

        let result = service.authenticate(None).await;
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));

        let result = service.authenticate(Some("  ")).await;
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_authenticate_invalid_token() {
        let service = service_with(MockAccountRepository::new(), true);

        let result = service.authenticate(Some("garbage")).await;
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_authenticate_deleted_account() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = service_with(repo, true);
        let token = service.issue_for(&sample_account(7, "ann@x.com")).unwrap();

        let result = service.authenticate(Some(&token)).await;
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_authenticate_after_password_change() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_id().returning(|id| {
            let mut account = sample_account(id, "ann@x.com");
            account.password_changed_at = Some(Utc::now() + Duration::seconds(1));
            Ok(Some(account))
        });

        let service = service_with(repo, true);
        let token = service.issue_for(&sample_account(7, "ann@x.com")).unwrap();

        let result = service.authenticate(Some(&token)).await;
        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_token_issued_after_change_is_accepted() {
        let changed_at = Utc::now() + Duration::milliseconds(500);
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_id().returning(move |id| {
            let mut account = sample_account(id, "ann@x.com");
            account.password_changed_at = Some(changed_at);
            Ok(Some(account))
        });

        let service = service_with(repo, true);
        let mut account = sample_account(7, "ann@x.com");
        account.password_changed_at = Some(changed_at);
        let token = service.issue_for(&account).unwrap();

        assert!(service.authenticate(Some(&token)).await.is_ok());
    }

    #[tokio::test]
    async fn test_token_issued_within_change_millisecond_is_accepted() {
        let changed_at = Utc::now();
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_id().returning(move |id| {
            let mut account = sample_account(id, "ann@x.com");
            account.password_changed_at = Some(changed_at);
            Ok(Some(account))
        });

        let service = service_with(repo, true);
        let mut account = sample_account(7, "ann@x.com");
        account.password_changed_at = Some(changed_at);
        let token = service.issue_for(&account).unwrap();

        assert!(service.authenticate(Some(&token)).await.is_ok());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let secure = service_with(MockAccountRepository::new(), true);
        let cookie = secure.session_cookie("abc");
        assert_eq!(
            cookie,
            format!("token=abc; HttpOnly; SameSite=Strict; Path=/; Max-Age={WEEK}; Secure")
        );

        let plain = service_with(MockAccountRepository::new(), false);
        assert!(!plain.session_cookie("abc").contains("Secure"));
    }
}
