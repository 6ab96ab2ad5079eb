//! Shared application state.

use std::sync::Arc;

use crate::application::services::{
    AuthService, LinkService, SessionService, TokenService,
};
use crate::config::Config;
use crate::domain::notifier::Notifier;
use crate::domain::repositories::{AccountRepository, LinkRepository};
use crate::utils::password::SecretHasher;

/// Services shared by every handler.
///
/// Cloned per request; all fields are `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub session_service: Arc<SessionService>,
    pub link_service: Arc<LinkService>,
}

impl AppState {
    /// Wires the services over the given collaborators.
    ///
    /// The server passes PostgreSQL repositories and the mail notifier; tests pass
    /// in-memory doubles.
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        links: Arc<dyn LinkRepository>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> Self {
        let auth_service = AuthService::new(
            accounts.clone(),
            notifier,
            SecretHasher::new(config.password_hash),
            SecretHasher::new(config.otp_hash),
            config.otp_lifetime_seconds,
        );

        let session_service = SessionService::new(
            accounts,
            TokenService::new(&config.jwt_secret, config.token_lifetime_seconds),
            config.cookie_secure,
        );

        let link_service = LinkService::new(links, config.base_url.clone());

        Self {
            auth_service: Arc::new(auth_service),
            session_service: Arc::new(session_service),
            link_service: Arc::new(link_service),
        }
    }
}
