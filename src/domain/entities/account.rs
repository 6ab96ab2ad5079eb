//! Account entity: identity, credentials, and verification state.

use chrono::{DateTime, Utc};

/// A registered account.
///
/// `password_hash` and `otp_hash` are Argon2 PHC strings; the raw values never reach
/// this type. Handlers expose accounts through [`crate::api::dto::auth::AccountView`],
/// which omits both hashes.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub verified: bool,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub otp_hash: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Returns true if a session issued at `issued_at` survives the last password change.
    ///
    /// Tokens issued at or before `password_changed_at` are stale.
    pub fn is_token_still_valid(&self, issued_at: DateTime<Utc>) -> bool {
        match self.password_changed_at {
            Some(changed_at) => issued_at > changed_at,
            None => true,
        }
    }

    /// Returns the stored OTP hash if it has not expired at `now`.
    pub fn live_otp_hash(&self, now: DateTime<Utc>) -> Option<&str> {
        match (&self.otp_hash, self.otp_expires_at) {
            (Some(hash), Some(expires_at)) if expires_at > now => Some(hash.as_str()),
            _ => None,
        }
    }

    /// Capitalized "First Last" used to greet the account holder.
    pub fn display_name(&self) -> String {
        let mut parts = vec![capitalize(&self.first_name)];
        if let Some(last) = self.last_name.as_deref().filter(|l| !l.is_empty()) {
            parts.push(capitalize(last));
        }
        parts.join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Input data for creating an account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub password_hash: String,
}

#[cfg(test)]
pub(crate) fn sample_account(id: i64, email: &str) -> Account {
    let now = Utc::now();
    Account {
        id,
        first_name: "ann".to_string(),
        last_name: None,
        email: email.to_string(),
        password_hash: "$argon2id$v=19$m=64,t=1,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
        verified: false,
        password_changed_at: None,
        otp_hash: None,
        otp_expires_at: None,
        created_at: now,
        updated_at: now,
    }
}
