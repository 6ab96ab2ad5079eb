//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod auth;
pub mod health;
pub mod redirect;
pub mod url;
pub mod user;

pub use auth::{login_handler, register_handler, resend_otp_handler, verify_otp_handler};
pub use health::health_handler;
pub use redirect::redirect_handler;
pub use url::{list_urls_handler, most_recent_handler, shorten_handler};
pub use user::{change_password_handler, get_me_handler};
