//! Infrastructure layer for external integrations.
//!
//! Implements the contracts defined by the domain layer.
//!
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`mail`] - lettre-backed OTP notifier

pub mod mail;
pub mod persistence;
