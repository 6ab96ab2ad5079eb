//! Validation of redirect targets.

use serde_json::json;
use url::Url;

use crate::error::AppError;

/// Checks that `raw` is an absolute `http`/`https` URL with a host.
///
/// The URL is stored as given (trimmed); redirects go exactly where the owner asked.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the URL is missing, unparsable, or uses another scheme.
pub fn check_target_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(AppError::bad_request("URL is missing", json!({})));
    }

    let parsed = Url::parse(trimmed).map_err(|e| {
        AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::bad_request(
            "Only http and https URLs can be shortened",
            json!({ "scheme": parsed.scheme() }),
        ));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::bad_request("URL must have a host", json!({})));
    }

    Ok(trimmed.to_string())
}
