//! Composition of the OTP verification message.
//!
//! This is the only place the plaintext OTP is formatted; it goes straight into the
//! outgoing message and is dropped afterwards.

use askama::Template;
use serde_json::json;

use crate::domain::entities::Account;
use crate::domain::notifier::OutgoingMail;
use crate::error::AppError;

pub const OTP_SUBJECT: &str = "URL Shortener: OTP for verification";

#[derive(Template)]
#[template(path = "otp_email.html")]
struct OtpEmailTemplate<'a> {
    user_name: &'a str,
    otp: &'a str,
    validity_minutes: i64,
}

/// Builds the OTP mail for `account`.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the HTML template fails to render.
pub fn compose(account: &Account, otp: &str, validity_seconds: i64) -> Result<OutgoingMail, AppError> {
    let user_name = account.display_name();
    let validity_minutes = (validity_seconds / 60).max(1);

    let html_body = OtpEmailTemplate {
        user_name: &user_name,
        otp,
        validity_minutes,
    }
    .render()
    .map_err(|e| {
        AppError::internal(
            "Failed to render OTP email",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(OutgoingMail {
        recipient: account.email.clone(),
        subject: OTP_SUBJECT.to_string(),
        text_body: format!("Your OTP for URL Shortener is: {otp}."),
        html_body,
    })
}

/// Extracts the code from a text body produced by [`compose`].
pub fn otp_from_text(text_body: &str) -> Option<&str> {
    text_body
        .strip_prefix("Your OTP for URL Shortener is: ")
        .and_then(|rest| rest.strip_suffix('.'))
}
