//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the durable store. Implementations live in
//! `crate::infrastructure::persistence`; mock implementations are generated with
//! `mockall` for unit tests.
//!
//! Repositories never hash or generate secrets: callers pass already-hashed values.
//!
//! # Available Repositories
//!
//! - [`AccountRepository`] - Account records, OTP state, verification
//! - [`LinkRepository`] - Short links and visit recording

pub mod account_repository;
pub mod link_repository;

pub use account_repository::AccountRepository;
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use account_repository::MockAccountRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
