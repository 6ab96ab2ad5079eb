//! Data Transfer Objects for API requests and responses.
//!
//! Request bodies default missing fields to empty values so the services report them
//! as validation errors instead of the extractor rejecting the body outright.

pub mod auth;
pub mod health;
pub mod url;

use serde::Serialize;

/// Literal `"success"` carried by every successful JSON body.
pub const SUCCESS: &str = "success";

/// Body for endpoints that only report an outcome.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: SUCCESS,
            message: message.into(),
        }
    }
}
