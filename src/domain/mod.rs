//! Domain layer containing business entities and collaborator contracts.
//!
//! Nothing in this module depends on the database, HTTP, or mail transport.
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`notifier`] - Outbound message contract used for OTP delivery

pub mod entities;
pub mod notifier;
pub mod repositories;
