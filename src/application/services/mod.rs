//! Business logic services for the application layer.

pub mod auth_service;
pub mod link_service;
pub mod session_service;
pub mod token_service;

pub use auth_service::{AuthService, Registration};
pub use link_service::{LinkService, ShortenedLink};
pub use session_service::SessionService;
pub use token_service::{TokenService, TokenStatus};
