//! PostgreSQL implementation of account repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Account, NewAccount};
use crate::domain::repositories::AccountRepository;
use crate::error::AppError;
use crate::utils::db_error::{ACCOUNT_EMAIL_CONSTRAINT, is_unique_violation_on};

const ACCOUNT_COLUMNS: &str = "id, first_name, last_name, email, password_hash, verified, \
     password_changed_at, otp_hash, otp_expires_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    first_name: String,
    last_name: Option<String>,
    email: String,
    password_hash: String,
    verified: bool,
    password_changed_at: Option<DateTime<Utc>>,
    otp_hash: Option<String>,
    otp_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(r: AccountRow) -> Self {
        Account {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            password_hash: r.password_hash,
            verified: r.verified,
            password_changed_at: r.password_changed_at,
            otp_hash: r.otp_hash,
            otp_expires_at: r.otp_expires_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// PostgreSQL repository for accounts.
///
/// Every mutation is a single statement returning the updated row, so callers never
/// observe a half-applied change.
pub struct PgAccountRepository {
    pool: Arc<PgPool>,
}

impl PgAccountRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }

    async fn create(&self, new_account: NewAccount) -> Result<Account, AppError> {
        let sql = format!(
            "INSERT INTO accounts (first_name, last_name, email, password_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(&new_account.first_name)
            .bind(&new_account.last_name)
            .bind(&new_account.email)
            .bind(&new_account.password_hash)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| {
                if is_unique_violation_on(&e, ACCOUNT_EMAIL_CONSTRAINT) {
                    AppError::conflict(
                        "Account already exists",
                        json!({ "email": new_account.email }),
                    )
                } else {
                    AppError::from(e)
                }
            })?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, AppError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Account::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Account::from))
    }

    async fn delete_unverified(&self, email: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE email = $1 AND verified = FALSE")
            .bind(email)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn store_otp(
        &self,
        id: i64,
        otp_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Account>, AppError> {
        let sql = format!(
            "UPDATE accounts \
             SET otp_hash = $2, otp_expires_at = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .bind(otp_hash)
            .bind(expires_at)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Account::from))
    }

    async fn mark_verified(&self, id: i64) -> Result<Option<Account>, AppError> {
        let sql = format!(
            "UPDATE accounts \
             SET verified = TRUE, otp_hash = NULL, otp_expires_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND verified = FALSE \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Account::from))
    }

    async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<Option<Account>, AppError> {
        let sql = format!(
            "UPDATE accounts \
             SET password_hash = $2, password_changed_at = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .bind(password_hash)
            .bind(changed_at)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Account::from))
    }

    async fn invalidate_sessions(&self, id: i64, at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE accounts SET password_changed_at = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, limit: i64) -> Result<Vec<Account>, AppError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at DESC, id DESC LIMIT $1"
        );

        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Account::from).collect())
    }
}
