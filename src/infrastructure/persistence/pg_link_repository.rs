//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewShortLink, ShortLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::db_error::{SHORT_LINK_CODE_CONSTRAINT, is_unique_violation_on};

const LINK_COLUMNS: &str =
    "id, code, owner_id, original_url, visit_history, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ShortLinkRow {
    id: i64,
    code: String,
    owner_id: i64,
    original_url: String,
    visit_history: Vec<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ShortLinkRow> for ShortLink {
    fn from(r: ShortLinkRow) -> Self {
        ShortLink {
            id: r.id,
            code: r.code,
            owner_id: r.owner_id,
            original_url: r.original_url,
            visit_history: r.visit_history,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// PostgreSQL repository for short links.
///
/// Visit history is a `TIMESTAMPTZ[]` column appended in place, so recording a visit is a
/// single row-locking `UPDATE`.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn insert(&self, new_link: NewShortLink) -> Result<Option<ShortLink>, AppError> {
        let sql = format!(
            "INSERT INTO short_links (code, owner_id, original_url) \
             VALUES ($1, $2, $3) \
             RETURNING {LINK_COLUMNS}"
        );

        let result = sqlx::query_as::<_, ShortLinkRow>(&sql)
            .bind(&new_link.code)
            .bind(new_link.owner_id)
            .bind(&new_link.original_url)
            .fetch_one(self.pool.as_ref())
            .await;

        match result {
            Ok(row) => Ok(Some(row.into())),
            Err(e) if is_unique_violation_on(&e, SHORT_LINK_CODE_CONSTRAINT) => {
                tracing::debug!(code = %new_link.code, "Short code collision");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn record_visit(
        &self,
        code: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<String>, AppError> {
        let url = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE short_links
            SET visit_history = array_append(visit_history, $2),
                updated_at = NOW()
            WHERE code = $1
            RETURNING original_url
            "#,
        )
        .bind(code)
        .bind(at)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(url)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM short_links WHERE code = $1");

        let row = sqlx::query_as::<_, ShortLinkRow>(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(ShortLink::from))
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<ShortLink>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM short_links \
             WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );

        let rows = sqlx::query_as::<_, ShortLinkRow>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(ShortLink::from).collect())
    }

    async fn most_recent_by_owner(&self, owner_id: i64) -> Result<Option<ShortLink>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM short_links \
             WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        );

        let row = sqlx::query_as::<_, ShortLinkRow>(&sql)
            .bind(owner_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(ShortLink::from))
    }
}
