//! Outbound notification contract.
//!
//! The service only needs "deliver this message to this address, or tell me it failed".
//! Transport details live in [`crate::infrastructure::mail`].

use async_trait::async_trait;

use crate::error::AppError;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub recipient: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Delivers messages to account holders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `mail`. Does not retry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DeliveryFailure`] if the message could not be handed off.
    async fn notify(&self, mail: OutgoingMail) -> Result<(), AppError>;
}
