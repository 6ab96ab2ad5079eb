#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use axum::{Extension, Router};
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use shortly::application::otp_mail::otp_from_text;
use shortly::config::Config;
use shortly::domain::entities::{Account, NewAccount, NewShortLink, ShortLink};
use shortly::domain::notifier::{Notifier, OutgoingMail};
use shortly::domain::repositories::{AccountRepository, LinkRepository};
use shortly::error::AppError;
use shortly::routes::build_router;
use shortly::state::AppState;
use shortly::utils::password::Argon2Params;

pub const PASSWORD: &str = "secret1";

/// Account store backed by a mutex-guarded vector, with the same conditional-update
/// semantics as the PostgreSQL repository.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    rows: Mutex<Vec<Account>>,
    next_id: Mutex<i64>,
}

impl InMemoryAccountRepository {
    pub fn get(&self, email: &str) -> Option<Account> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email)
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Moves the stored OTP expiry, e.g. into the past.
    pub fn set_otp_expiry(&self, email: &str, expires_at: DateTime<Utc>) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(a) = rows.iter_mut().find(|a| a.email == email) {
            a.otp_expires_at = Some(expires_at);
        }
    }

    fn update<F>(&self, id: i64, f: F) -> Option<Account>
    where
        F: FnOnce(&mut Account) -> bool,
    {
        let mut rows = self.rows.lock().unwrap();
        let account = rows.iter_mut().find(|a| a.id == id)?;
        if !f(account) {
            return None;
        }
        account.updated_at = Utc::now();
        Some(account.clone())
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn create(&self, new_account: NewAccount) -> Result<Account, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|a| a.email == new_account.email) {
            return Err(AppError::conflict("Account already exists", json!({})));
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let now = Utc::now();
        let account = Account {
            id: *next_id,
            first_name: new_account.first_name,
            last_name: new_account.last_name,
            email: new_account.email,
            password_hash: new_account.password_hash,
            verified: false,
            password_changed_at: None,
            otp_hash: None,
            otp_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        rows.push(account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self.get(email))
    }

    async fn delete_unverified(&self, email: &str) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|a| !(a.email == email && !a.verified));
        Ok(rows.len() < before)
    }

    async fn store_otp(
        &self,
        id: i64,
        otp_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Account>, AppError> {
        Ok(self.update(id, |a| {
            a.otp_hash = Some(otp_hash.to_string());
            a.otp_expires_at = Some(expires_at);
            true
        }))
    }

    async fn mark_verified(&self, id: i64) -> Result<Option<Account>, AppError> {
        Ok(self.update(id, |a| {
            if a.verified {
                return false;
            }
            a.verified = true;
            a.otp_hash = None;
            a.otp_expires_at = None;
            true
        }))
    }

    async fn update_password(
        &self,
        id: i64,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<Option<Account>, AppError> {
        Ok(self.update(id, |a| {
            a.password_hash = password_hash.to_string();
            a.password_changed_at = Some(changed_at);
            true
        }))
    }

    async fn invalidate_sessions(&self, id: i64, at: DateTime<Utc>) -> Result<bool, AppError> {
        Ok(self
            .update(id, |a| {
                a.password_changed_at = Some(at);
                true
            })
            .is_some())
    }

    async fn list(&self, limit: i64) -> Result<Vec<Account>, AppError> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }
}

/// Link store whose visit append happens under one lock, like the single `UPDATE`.
#[derive(Default)]
pub struct InMemoryLinkRepository {
    rows: Mutex<Vec<ShortLink>>,
    next_id: Mutex<i64>,
}

impl InMemoryLinkRepository {
    pub fn get(&self, code: &str) -> Option<ShortLink> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.code == code)
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn insert(&self, new_link: NewShortLink) -> Result<Option<ShortLink>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|l| l.code == new_link.code) {
            return Ok(None);
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let now = Utc::now();
        let link = ShortLink {
            id: *next_id,
            code: new_link.code,
            owner_id: new_link.owner_id,
            original_url: new_link.original_url,
            visit_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        rows.push(link.clone());
        Ok(Some(link))
    }

    async fn record_visit(
        &self,
        code: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<String>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|l| l.code == code).map(|link| {
            link.visit_history.push(at);
            link.updated_at = Utc::now();
            link.original_url.clone()
        }))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError> {
        Ok(self.get(code))
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<ShortLink>, AppError> {
        let mut owned: Vec<ShortLink> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }

    async fn most_recent_by_owner(&self, owner_id: i64) -> Result<Option<ShortLink>, AppError> {
        Ok(self.list_by_owner(owner_id).await?.into_iter().next())
    }
}

/// Notifier that keeps every message and can be switched into failure mode.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OutgoingMail>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_mail_to(&self, recipient: &str) -> Option<OutgoingMail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.recipient == recipient)
            .cloned()
    }

    /// Plaintext OTP from the newest mail to `recipient`.
    pub fn last_otp_for(&self, recipient: &str) -> Option<String> {
        self.last_mail_to(recipient)
            .and_then(|m| otp_from_text(&m.text_body).map(str::to_string))
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, mail: OutgoingMail) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::delivery_failure(
                "Failed to send OTP email",
                json!({}),
            ));
        }
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

pub fn fast_hash() -> Argon2Params {
    Argon2Params {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/unused".to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        base_url: "http://sho.rt".to_string(),
        log_level: "info".to_string(),
        log_format: "text".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        token_lifetime_seconds: 7 * 24 * 3600,
        otp_lifetime_seconds: 120,
        password_hash: fast_hash(),
        otp_hash: fast_hash(),
        cookie_secure: true,
        cors_origin: None,
        smtp: None,
        mail_from: "URL Shortener <no-reply@localhost>".to_string(),
        mail_spool_dir: "./mail".to_string(),
        db_max_connections: 1,
        db_connect_timeout: 1,
        db_idle_timeout: 1,
        db_max_lifetime: 1,
    }
}

/// A running router over in-memory collaborators.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub accounts: Arc<InMemoryAccountRepository>,
    pub links: Arc<InMemoryLinkRepository>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config())
}

pub fn spawn_app_with(config: Config) -> TestApp {
    let accounts = Arc::new(InMemoryAccountRepository::default());
    let links = Arc::new(InMemoryLinkRepository::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let state = AppState::new(accounts.clone(), links.clone(), notifier.clone(), &config);

    // The rate limiter keys on the peer address, which `TestServer` does not provide.
    let app: Router = build_router(state.clone(), None).layer(Extension(ConnectInfo(
        SocketAddr::from(([127, 0, 0, 1], 12345)),
    )));

    TestApp {
        server: TestServer::new(app).unwrap(),
        state,
        accounts,
        links,
        notifier,
    }
}

impl TestApp {
    pub async fn register(&self, first_name: &str, email: &str, password: &str) -> Value {
        let response = self
            .server
            .post("/api/v1/auth/register")
            .json(&json!({ "firstname": first_name, "email": email, "password": password }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()
    }

    /// Registers and verifies `email`, returning the session token.
    pub async fn verified_session(&self, email: &str) -> String {
        self.register("ann", email, PASSWORD).await;
        let otp = self.notifier.last_otp_for(email).unwrap();

        let response = self
            .server
            .post("/api/v1/auth/verify-otp")
            .json(&json!({ "email": email, "otp": otp }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    pub async fn shorten(&self, token: &str, url: &str) -> Value {
        let response = self
            .server
            .post("/api/v1/url/shorten")
            .authorization_bearer(token)
            .json(&json!({ "url": url }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()
    }
}
