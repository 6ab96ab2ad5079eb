//! Credential and OTP service: registration, verification, login, password change.

use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use validator::ValidateEmail;

use crate::application::otp_mail;
use crate::domain::entities::{Account, NewAccount};
use crate::domain::notifier::Notifier;
use crate::domain::repositories::AccountRepository;
use crate::error::AppError;
use crate::utils::otp::{self, generate_otp};
use crate::utils::password::SecretHasher;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Raw registration input as received from the client.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub password: String,
}

/// Service owning every credential check and account state transition.
///
/// Passwords and OTPs are hashed here before they reach the repository; the repository
/// only ever stores and compares PHC strings it was handed.
pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    notifier: Arc<dyn Notifier>,
    password_hasher: SecretHasher,
    otp_hasher: SecretHasher,
    otp_lifetime: Duration,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        notifier: Arc<dyn Notifier>,
        password_hasher: SecretHasher,
        otp_hasher: SecretHasher,
        otp_lifetime_seconds: i64,
    ) -> Self {
        Self {
            accounts,
            notifier,
            password_hasher,
            otp_hasher,
            otp_lifetime: Duration::seconds(otp_lifetime_seconds),
        }
    }

    /// Checks that the account store is reachable.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.accounts.ping().await
    }

    /// Creates an unverified account.
    ///
    /// An unverified account already holding the email is replaced, so an abandoned
    /// sign-up never blocks a new one.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] on missing first name, malformed email, or short password
    /// - [`AppError::Conflict`] if a verified account owns the email
    pub async fn register(&self, input: Registration) -> Result<Account, AppError> {
        let first_name = input.first_name.trim().to_string();
        let last_name = input
            .last_name
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        let email = input.email.trim().to_string();

        if first_name.is_empty() {
            return Err(AppError::bad_request(
                "First name is required.",
                json!({ "field": "first_name" }),
            ));
        }
        if !email.validate_email() {
            return Err(AppError::bad_request(
                "Please provide a valid email address.",
                json!({ "field": "email" }),
            ));
        }
        check_password_length(&input.password, "password")?;

        if let Some(existing) = self.accounts.find_by_email(&email).await? {
            if existing.verified {
                return Err(AppError::conflict(
                    "Account already exists",
                    json!({ "email": email }),
                ));
            }
            self.accounts.delete_unverified(&email).await?;
            tracing::info!(email = %email, "Replacing unverified account");
        }

        let password_hash = self.password_hasher.hash(&input.password).await?;
        let account = self
            .accounts
            .create(NewAccount {
                first_name,
                last_name,
                email,
                password_hash,
            })
            .await?;

        metrics::counter!("accounts_registered_total").increment(1);
        tracing::info!(account_id = account.id, "Account registered");

        Ok(account)
    }

    /// Generates a fresh OTP for the account and mails it.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the account does not exist
    /// - [`AppError::AlreadyVerified`] if it is already verified
    /// - [`AppError::DeliveryFailure`] if the mail could not be sent
    pub async fn issue_otp(&self, account_id: i64) -> Result<(), AppError> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found("User not found", json!({ "account_id": account_id }))
            })?;

        self.send_otp(account).await
    }

    /// Same as [`Self::issue_otp`], looked up by email.
    pub async fn resend_otp(&self, email: &str) -> Result<(), AppError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::bad_request(
                "Email is required.",
                json!({ "field": "email" }),
            ));
        }

        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("Invalid email: User not found.", json!({})))?;

        self.send_otp(account).await
    }

    async fn send_otp(&self, account: Account) -> Result<(), AppError> {
        if account.verified {
            return Err(AppError::already_verified(
                "Email is already verified.",
                json!({}),
            ));
        }

        let otp = generate_otp();
        let otp_hash = self.otp_hasher.hash(&otp).await?;
        let expires_at = Utc::now() + self.otp_lifetime;

        let account = self
            .accounts
            .store_otp(account.id, &otp_hash, expires_at)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({})))?;

        let mail = otp_mail::compose(&account, &otp, self.otp_lifetime.num_seconds())?;
        self.notifier.notify(mail).await?;

        metrics::counter!("otp_issued_total").increment(1);
        tracing::info!(account_id = account.id, "OTP issued");

        Ok(())
    }

    /// Verifies an OTP and marks the account verified.
    ///
    /// # Errors
    ///
    /// - [`AppError::OtpInvalidOrExpired`] if the email is unknown or no live OTP exists
    /// - [`AppError::AlreadyVerified`] if the account was verified before or concurrently
    /// - [`AppError::WrongCredential`] if the OTP does not match
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<Account, AppError> {
        let email = email.trim();
        let otp = otp.trim();
        if email.is_empty() || otp.is_empty() {
            return Err(AppError::bad_request(
                "Both email and OTP are required.",
                json!({}),
            ));
        }

        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or_else(AppError::otp_invalid_or_expired)?;

        if account.verified {
            return Err(AppError::already_verified(
                "Email is already verified.",
                json!({}),
            ));
        }

        let otp_hash = account
            .live_otp_hash(Utc::now())
            .ok_or_else(AppError::otp_invalid_or_expired)?;

        if !otp::is_well_formed(otp) || !self.otp_hasher.verify(otp, otp_hash).await? {
            tracing::debug!(account_id = account.id, "OTP mismatch");
            return Err(AppError::wrong_credential("Incorrect OTP", json!({})));
        }

        let account = self
            .accounts
            .mark_verified(account.id)
            .await?
            .ok_or_else(|| AppError::already_verified("Email is already verified.", json!({})))?;

        metrics::counter!("accounts_verified_total").increment(1);
        tracing::info!(account_id = account.id, "Account verified");

        Ok(account)
    }

    /// Checks email and password.
    ///
    /// Unverified accounts may log in.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if either field is empty
    /// - [`AppError::NotFound`] if no account has the email
    /// - [`AppError::WrongCredential`] on password mismatch
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, AppError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::bad_request(
                "Some required fields are missing. Both email and password are required.",
                json!({}),
            ));
        }

        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or_else(|| {
                AppError::not_found("No record found for this email address.", json!({}))
            })?;

        if !self
            .password_hasher
            .verify(password, &account.password_hash)
            .await?
        {
            return Err(AppError::wrong_credential("Incorrect password", json!({})));
        }

        tracing::info!(account_id = account.id, "Login succeeded");
        Ok(account)
    }

    /// Replaces the password and stamps `password_changed_at`, invalidating older sessions.
    ///
    /// # Errors
    ///
    /// - [`AppError::WrongCredential`] if `current_password` does not match
    /// - [`AppError::Validation`] if `new_password` is too short
    pub async fn change_password(
        &self,
        account: &Account,
        current_password: &str,
        new_password: &str,
    ) -> Result<Account, AppError> {
        if !self
            .password_hasher
            .verify(current_password, &account.password_hash)
            .await?
        {
            return Err(AppError::wrong_credential(
                "Your current password is wrong.",
                json!({}),
            ));
        }
        check_password_length(new_password, "new_password")?;

        let password_hash = self.password_hasher.hash(new_password).await?;
        let updated = self
            .accounts
            .update_password(account.id, &password_hash, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({})))?;

        tracing::info!(account_id = updated.id, "Password changed");
        Ok(updated)
    }

    /// Fetches an account by id.
    pub async fn get_account(&self, account_id: i64) -> Result<Account, AppError> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "account_id": account_id })))
    }
}

fn check_password_length(password: &str, field: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::bad_request(
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters long."),
            json!({ "field": field }),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::account::sample_account;
    use crate::domain::notifier::{MockNotifier, OutgoingMail};
    use crate::domain::repositories::MockAccountRepository;
    use crate::utils::password::{Argon2Params, hash_secret};
    use std::sync::Mutex;

    fn fast() -> Argon2Params {
        Argon2Params {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn service(repo: MockAccountRepository, notifier: MockNotifier) -> AuthService {
        AuthService::new(
            Arc::new(repo),
            Arc::new(notifier),
            SecretHasher::new(fast()),
            SecretHasher::new(fast()),
            120,
        )
    }

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            first_name: "  Ann ".to_string(),
            last_name: None,
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn account_with_password(id: i64, email: &str, password: &str) -> Account {
        let mut account = sample_account(id, email);
        account.password_hash = hash_secret(password, fast()).unwrap();
        account
    }

    fn account_with_otp(id: i64, email: &str, otp: &str, ttl_secs: i64) -> Account {
        let mut account = sample_account(id, email);
        account.otp_hash = Some(hash_secret(otp, fast()).unwrap());
        account.otp_expires_at = Some(Utc::now() + Duration::seconds(ttl_secs));
        account
    }

    #[tokio::test]
    async fn test_register_success_hashes_password() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email().times(1).returning(|_| Ok(None));
        repo.expect_delete_unverified().times(0);
        repo.expect_create()
            .withf(|new| {
                new.first_name == "Ann"
                    && new.email == "ann@x.com"
                    && new.password_hash.starts_with("$argon2id$")
                    && !new.password_hash.contains("secret1")
            })
            .times(1)
            .returning(|new| {
                let mut account = sample_account(1, &new.email);
                account.password_hash = new.password_hash;
                Ok(account)
            });

        let account = service(repo, MockNotifier::new())
            .register(registration("ann@x.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(account.email, "ann@x.com");
        assert!(!account.verified);
    }

    #[tokio::test]
    async fn test_register_validation_errors() {
        let svc = service(MockAccountRepository::new(), MockNotifier::new());

        let mut no_name = registration("ann@x.com", "secret1");
        no_name.first_name = "   ".to_string();
        assert!(matches!(
            svc.register(no_name).await,
            Err(AppError::Validation { .. })
        ));

        assert!(matches!(
            svc.register(registration("not-an-email", "secret1")).await,
            Err(AppError::Validation { .. })
        ));

        assert!(matches!(
            svc.register(registration("ann@x.com", "12345")).await,
            Err(AppError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_register_conflicts_with_verified_account() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email().returning(|email| {
            let mut account = sample_account(1, email);
            account.verified = true;
            Ok(Some(account))
        });
        repo.expect_create().times(0);

        let result = service(repo, MockNotifier::new())
            .register(registration("ann@x.com", "secret1"))
            .await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_register_replaces_unverified_account() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email()
            .returning(|email| Ok(Some(sample_account(1, email))));
        repo.expect_delete_unverified()
            .times(1)
            .returning(|_| Ok(true));
        repo.expect_create()
            .times(1)
            .returning(|new| Ok(sample_account(2, &new.email)));

        let account = service(repo, MockNotifier::new())
            .register(registration("ann@x.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(account.id, 2);
    }

    #[tokio::test]
    async fn test_issue_otp_stores_hash_and_mails_code() {
        let stored_hash = Arc::new(Mutex::new(String::new()));
        let sent = Arc::new(Mutex::new(None::<OutgoingMail>));

        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(sample_account(id, "ann@x.com"))));
        let hash_slot = stored_hash.clone();
        repo.expect_store_otp()
            .withf(|_, _, expires_at| {
                let ttl = (*expires_at - Utc::now()).num_seconds();
                (110..=120).contains(&ttl)
            })
            .times(1)
            .returning(move |id, hash, expires_at| {
                *hash_slot.lock().unwrap() = hash.to_string();
                let mut account = sample_account(id, "ann@x.com");
                account.otp_hash = Some(hash.to_string());
                account.otp_expires_at = Some(expires_at);
                Ok(Some(account))
            });

        let mut notifier = MockNotifier::new();
        let mail_slot = sent.clone();
        notifier.expect_notify().times(1).returning(move |mail| {
            *mail_slot.lock().unwrap() = Some(mail);
            Ok(())
        });

        service(repo, notifier).issue_otp(1).await.unwrap();

        let mail = sent.lock().unwrap().clone().unwrap();
        assert_eq!(mail.recipient, "ann@x.com");
        let code = otp_mail::otp_from_text(&mail.text_body).unwrap().to_string();
        assert_eq!(code.len(), 4);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let hash = stored_hash.lock().unwrap().clone();
        assert_ne!(hash, code);
        assert!(crate::utils::password::verify_secret(&code, &hash).unwrap());
    }

    #[tokio::test]
    async fn test_issue_otp_unknown_account() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let result = service(repo, MockNotifier::new()).issue_otp(9).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_resend_otp_to_verified_account_rejected() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email().returning(|email| {
            let mut account = sample_account(1, email);
            account.verified = true;
            Ok(Some(account))
        });
        repo.expect_store_otp().times(0);

        let result = service(repo, MockNotifier::new())
            .resend_otp("ann@x.com")
            .await;
        assert!(matches!(result, Err(AppError::AlreadyVerified { .. })));
    }

    #[tokio::test]
    async fn test_resend_otp_unknown_email() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));

        let result = service(repo, MockNotifier::new())
            .resend_otp("nobody@x.com")
            .await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delivery_failure_surfaces() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email()
            .returning(|email| Ok(Some(sample_account(1, email))));
        repo.expect_store_otp().returning(|id, hash, expires_at| {
            let mut account = sample_account(id, "ann@x.com");
            account.otp_hash = Some(hash.to_string());
            account.otp_expires_at = Some(expires_at);
            Ok(Some(account))
        });

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .returning(|_| Err(AppError::delivery_failure("smtp down", json!({}))));

        let result = service(repo, notifier).resend_otp("ann@x.com").await;
        assert!(matches!(result, Err(AppError::DeliveryFailure { .. })));
    }

    #[tokio::test]
    async fn test_verify_otp_success() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email()
            .returning(|email| Ok(Some(account_with_otp(1, email, "4821", 60))));
        repo.expect_mark_verified().times(1).returning(|id| {
            let mut account = sample_account(id, "ann@x.com");
            account.verified = true;
            Ok(Some(account))
        });

        let account = service(repo, MockNotifier::new())
            .verify_otp("ann@x.com", "4821")
            .await
            .unwrap();

        assert!(account.verified);
        assert!(account.otp_hash.is_none());
    }

    #[tokio::test]
    async fn test_verify_otp_wrong_code() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email()
            .returning(|email| Ok(Some(account_with_otp(1, email, "4821", 60))));
        repo.expect_mark_verified().times(0);

        let result = service(repo, MockNotifier::new())
            .verify_otp("ann@x.com", "0000")
            .await;
        assert!(matches!(result, Err(AppError::WrongCredential { .. })));
    }

    #[tokio::test]
    async fn test_verify_otp_expired() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email()
            .returning(|email| Ok(Some(account_with_otp(1, email, "4821", -1))));
        repo.expect_mark_verified().times(0);

        let result = service(repo, MockNotifier::new())
            .verify_otp("ann@x.com", "4821")
            .await;
        assert!(matches!(result, Err(AppError::OtpInvalidOrExpired { .. })));
    }

    #[tokio::test]
    async fn test_verify_otp_unknown_email_is_generic() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));

        let err = service(repo, MockNotifier::new())
            .verify_otp("nobody@x.com", "4821")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::OtpInvalidOrExpired { .. }));
        assert_eq!(err.to_string(), crate::error::OTP_INVALID_OR_EXPIRED_MESSAGE);
    }

    #[tokio::test]
    async fn test_verify_otp_already_verified() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email().returning(|email| {
            let mut account = sample_account(1, email);
            account.verified = true;
            Ok(Some(account))
        });

        let result = service(repo, MockNotifier::new())
            .verify_otp("ann@x.com", "4821")
            .await;
        assert!(matches!(result, Err(AppError::AlreadyVerified { .. })));
    }

    #[tokio::test]
    async fn test_verify_otp_lost_race_is_already_verified() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email()
            .returning(|email| Ok(Some(account_with_otp(1, email, "4821", 60))));
        repo.expect_mark_verified().returning(|_| Ok(None));

        let result = service(repo, MockNotifier::new())
            .verify_otp("ann@x.com", "4821")
            .await;
        assert!(matches!(result, Err(AppError::AlreadyVerified { .. })));
    }

    #[tokio::test]
    async fn test_login_success_and_wrong_password() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email()
            .returning(|email| Ok(Some(account_with_password(1, email, "secret1"))));
        let svc = service(repo, MockNotifier::new());

        let account = svc.login("ann@x.com", "secret1").await.unwrap();
        assert_eq!(account.id, 1);

        let result = svc.login("ann@x.com", "wrong!!").await;
        assert!(matches!(result, Err(AppError::WrongCredential { .. })));
    }

    #[tokio::test]
    async fn test_login_missing_fields_and_unknown_email() {
        let mut repo = MockAccountRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        let svc = service(repo, MockNotifier::new());

        assert!(matches!(
            svc.login("", "secret1").await,
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            svc.login("ann@x.com", "").await,
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            svc.login("nobody@x.com", "secret1").await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_change_password_stamps_change_time() {
        let mut repo = MockAccountRepository::new();
        repo.expect_update_password()
            .withf(|id, hash, changed_at| {
                *id == 1
                    && hash.starts_with("$argon2id$")
                    && (Utc::now() - *changed_at).num_seconds() < 5
            })
            .times(1)
            .returning(|id, hash, changed_at| {
                let mut account = sample_account(id, "ann@x.com");
                account.password_hash = hash.to_string();
                account.password_changed_at = Some(changed_at);
                Ok(Some(account))
            });

        let account = account_with_password(1, "ann@x.com", "secret1");
        let updated = service(repo, MockNotifier::new())
            .change_password(&account, "secret1", "secret2")
            .await
            .unwrap();

        assert!(updated.password_changed_at.is_some());
        assert!(crate::utils::password::verify_secret("secret2", &updated.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_change_password_rejects_wrong_current_and_short_new() {
        let mut repo = MockAccountRepository::new();
        repo.expect_update_password().times(0);
        let svc = service(repo, MockNotifier::new());
        let account = account_with_password(1, "ann@x.com", "secret1");

        assert!(matches!(
            svc.change_password(&account, "nope!!", "secret2").await,
            Err(AppError::WrongCredential { .. })
        ));
        assert!(matches!(
            svc.change_password(&account, "secret1", "short").await,
            Err(AppError::Validation { .. })
        ));
    }
}
