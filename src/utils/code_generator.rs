//! Short code generation.
//!
//! Codes are drawn from the OS random source and encoded as URL-safe base64, so every
//! code is exactly [`CODE_LENGTH`] characters from `[A-Za-z0-9_-]`.

use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;

/// Length of a generated short code in characters.
pub const CODE_LENGTH: usize = 8;

/// Random bytes consumed per code. 6 bytes encode to exactly 8 base64 characters.
const CODE_LENGTH_BYTES: usize = CODE_LENGTH / 4 * 3;

/// Generates a cryptographically secure random short code.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random number generator fails.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code()?;
/// assert_eq!(code.len(), 8);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
/// ```
pub fn generate_code() -> Result<String, AppError> {
    let mut buffer = [0u8; CODE_LENGTH_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate short code",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}

/// Returns true if `code` has the shape of a generated short code.
///
/// Used by the redirect route to reject obviously foreign paths without a database trip.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
