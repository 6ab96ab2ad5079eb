//! Signed session tokens.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::entities::Account;
use crate::error::AppError;

/// Claims carried by a session token.
///
/// `iat` keeps second precision for interoperability; `iat_ms` is what the password-change
/// cutoff compares against, so a token minted right after a change is not mistaken for a
/// stale one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    iat: i64,
    exp: i64,
    iat_ms: i64,
}

/// Outcome of checking a presented token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Valid {
        account_id: i64,
        issued_at: DateTime<Utc>,
    },
    Invalid,
}

/// Issues and verifies HS256 session tokens with a fixed lifetime.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &str, lifetime_seconds: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime: Duration::seconds(lifetime_seconds),
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues a token for `account_id` stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if signing fails.
    pub fn issue(&self, account_id: i64) -> Result<String, AppError> {
        self.issue_at(account_id, Utc::now())
    }

    /// Issues a token as if minted at `issued_at`. Expiry is `issued_at + lifetime`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if signing fails.
    pub fn issue_at(&self, account_id: i64, issued_at: DateTime<Utc>) -> Result<String, AppError> {
        let expires_at = issued_at + self.lifetime;
        let claims = SessionClaims {
            sub: account_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iat_ms: issued_at.timestamp_millis(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign session token");
            AppError::internal("Failed to issue session token", json!({}))
        })
    }

    /// Checks signature, expiry, and claim shape. Never fails; anything wrong is `Invalid`.
    pub fn verify(&self, token: &str) -> TokenStatus {
        let claims = match decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                return TokenStatus::Invalid;
            }
        };

        let Ok(account_id) = claims.sub.parse::<i64>() else {
            return TokenStatus::Invalid;
        };

        match Utc.timestamp_millis_opt(claims.iat_ms).single() {
            Some(issued_at) => TokenStatus::Valid {
                account_id,
                issued_at,
            },
            None => TokenStatus::Invalid,
        }
    }
}

/// Returns true if a token issued at `issued_at` predates no password change of `account`.
pub fn is_still_valid(issued_at: DateTime<Utc>, account: &Account) -> bool {
    account.is_token_still_valid(issued_at)
}
