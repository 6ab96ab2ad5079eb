//! Core domain entities.
//!
//! Entities are plain data structures with small helpers; orchestration lives in
//! [`crate::application::services`].
//!
//! - [`Account`] - A registered user with credentials and verification state
//! - [`ShortLink`] - A short code mapped to an original URL
//!
//! Creation inputs use separate `New*` structs.

pub mod account;
pub mod short_link;

pub use account::{Account, NewAccount};
pub use short_link::{NewShortLink, ShortLink};
