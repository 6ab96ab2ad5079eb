//! Mail delivery for OTP notifications.
//!
//! [`MailNotifier`] implements [`crate::domain::notifier::Notifier`] over lettre, using
//! an SMTP relay when configured and a local `.eml` spool directory otherwise.

pub mod mail_notifier;

pub use mail_notifier::MailNotifier;
