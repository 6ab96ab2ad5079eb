//! Classification of PostgreSQL constraint violations.

/// Unique constraint on `short_links.code`.
pub const SHORT_LINK_CODE_CONSTRAINT: &str = "short_links_code_key";

/// Unique constraint on `accounts.email`.
pub const ACCOUNT_EMAIL_CONSTRAINT: &str = "accounts_email_key";

/// Returns true if `e` is a unique violation of the constraint named `constraint`.
pub fn is_unique_violation_on(e: &sqlx::Error, constraint: &str) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    db_err.constraint() == Some(constraint)
}
