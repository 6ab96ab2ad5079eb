//! Utility functions for code generation, secret hashing, and URL checks.
//!
//! - [`code_generator`] - Short code generation
//! - [`otp`] - One-time password generation
//! - [`password`] - Argon2 hashing for passwords and OTPs
//! - [`db_error`] - Classification of database constraint violations
//! - [`url_check`] - Target URL validation

pub mod code_generator;
pub mod db_error;
pub mod otp;
pub mod password;
pub mod url_check;
