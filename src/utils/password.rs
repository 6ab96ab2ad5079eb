//! Argon2 hashing for passwords and one-time passwords.
//!
//! Hashes are PHC strings with their own salt and parameters embedded, so verification
//! works even after the configured work factor changes. Hashing is CPU-bound and runs on
//! tokio's blocking pool.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde_json::json;

use crate::error::AppError;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    /// Lighter parameters for short-lived secrets such as OTPs.
    pub fn light() -> Self {
        Self {
            memory_kib: 4096,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn to_argon2(self) -> Result<Argon2<'static>, AppError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| {
                AppError::internal(
                    "Invalid hashing parameters",
                    json!({ "reason": e.to_string() }),
                )
            })?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    /// OWASP-recommended Argon2id minimum (19 MiB, 2 passes).
    fn default() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Hashes a secret synchronously.
pub fn hash_secret(secret: &str, params: Argon2Params) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = params
        .to_argon2()?
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AppError::internal("Failed to hash secret", json!({ "reason": e.to_string() })))?;

    Ok(hash.to_string())
}

/// Verifies a secret against a stored PHC hash synchronously.
///
/// A malformed stored hash is an internal error, not a mismatch.
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        AppError::internal("Stored hash is malformed", json!({ "reason": e.to_string() }))
    })?;

    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}

/// Async front-end over [`hash_secret`]/[`verify_secret`] with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct SecretHasher {
    params: Argon2Params,
}

impl SecretHasher {
    pub fn new(params: Argon2Params) -> Self {
        Self { params }
    }

    /// Hashes `secret` on the blocking pool.
    pub async fn hash(&self, secret: &str) -> Result<String, AppError> {
        let secret = secret.to_owned();
        let params = self.params;
        tokio::task::spawn_blocking(move || hash_secret(&secret, params))
            .await
            .map_err(join_error)?
    }

    /// Compares `secret` against `hash` on the blocking pool.
    pub async fn verify(&self, secret: &str, hash: &str) -> Result<bool, AppError> {
        let secret = secret.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || verify_secret(&secret, &hash))
            .await
            .map_err(join_error)?
    }
}

fn join_error(e: tokio::task::JoinError) -> AppError {
    tracing::error!(error = %e, "Hashing task failed");
    AppError::internal("Hashing task failed", json!({}))
}
