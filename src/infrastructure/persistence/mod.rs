//! PostgreSQL repository implementations.
//!
//! Queries are built at runtime with `sqlx::query_as` and mapped through private
//! `FromRow` row types into domain entities.
//!
//! - [`PgAccountRepository`] - Accounts, OTP state, verification
//! - [`PgLinkRepository`] - Short links and visit history

pub mod pg_account_repository;
pub mod pg_link_repository;

pub use pg_account_repository::PgAccountRepository;
pub use pg_link_repository::PgLinkRepository;
