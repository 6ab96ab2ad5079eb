//! DTOs for registration, OTP, login, and account endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::Registration;
use crate::domain::entities::Account;

/// Sign-up body. Field names follow the public API (`firstname`, `lastname`).
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    #[serde(alias = "first_name")]
    #[validate(length(max = 100, message = "First name is too long"))]
    pub firstname: String,

    #[serde(alias = "last_name")]
    #[validate(length(max = 100, message = "Last name is too long"))]
    pub lastname: Option<String>,

    #[validate(length(max = 254, message = "Email is too long"))]
    pub email: String,

    #[validate(length(max = 128, message = "Password is too long"))]
    pub password: String,
}

impl From<RegisterRequest> for Registration {
    fn from(r: RegisterRequest) -> Self {
        Registration {
            first_name: r.firstname,
            last_name: r.lastname,
            email: r.email,
            password: r.password,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResendOtpRequest {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ChangePasswordRequest {
    pub current_password: String,

    #[validate(length(max = 128, message = "Password is too long"))]
    pub new_password: String,
}

/// Public projection of an account. Never carries password or OTP material.
#[derive(Debug, Serialize)]
pub struct AccountView {
    pub id: i64,
    pub firstname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    pub email: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(a: &Account) -> Self {
        AccountView {
            id: a.id,
            firstname: a.first_name.clone(),
            lastname: a.last_name.clone(),
            email: a.email.clone(),
            verified: a.verified,
            created_at: a.created_at,
        }
    }
}

/// Returned by verify-otp, login, and change-password alongside the session cookie.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub status: &'static str,
    pub message: String,
    pub token: String,
    pub user: AccountView,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub status: &'static str,
    pub message: String,
    pub user: AccountView,
}
