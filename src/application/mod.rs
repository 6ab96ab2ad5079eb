//! Application layer services implementing business logic.
//!
//! Services coordinate repositories, hashing, token signing, and notification. HTTP
//! handlers call services and never touch repositories directly.
//!
//! - [`services::AuthService`] - Registration, OTP lifecycle, login, password change
//! - [`services::TokenService`] - Signed session token issue/verify
//! - [`services::SessionService`] - Authentication gate over tokens and accounts
//! - [`services::LinkService`] - Short link creation, resolution, listing
//! - [`otp_mail`] - OTP message composition

pub mod otp_mail;
pub mod services;
