//! lettre-backed notifier.

use async_trait::async_trait;
use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use serde_json::json;
use std::path::Path;

use crate::config::Config;
use crate::domain::notifier::{Notifier, OutgoingMail};
use crate::error::AppError;

/// Port on which SMTP relays expect implicit TLS rather than STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

enum MailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

/// Sends multipart (plain + HTML) mail through SMTP or into a spool directory.
pub struct MailNotifier {
    transport: MailTransport,
    from: Mailbox,
}

impl MailNotifier {
    /// Builds the notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `MAIL_FROM` is not a valid mailbox, the SMTP relay cannot be
    /// configured, or the spool directory cannot be created.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let from: Mailbox = config
            .mail_from
            .parse()
            .map_err(|e| anyhow::anyhow!("MAIL_FROM is not a valid mailbox: {e}"))?;

        let transport = match &config.smtp {
            Some(smtp) => {
                let builder = if smtp.port == IMPLICIT_TLS_PORT {
                    AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
                };

                let builder = builder.port(smtp.port);
                let builder = if smtp.username.is_empty() {
                    builder
                } else {
                    builder.credentials(Credentials::new(
                        smtp.username.clone(),
                        smtp.password.clone(),
                    ))
                };

                MailTransport::Smtp(builder.build())
            }
            None => {
                let dir = Path::new(&config.mail_spool_dir);
                std::fs::create_dir_all(dir)?;
                tracing::warn!(
                    "SMTP is not configured; OTP mail is written to {}",
                    dir.display()
                );
                MailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(dir))
            }
        };

        Ok(Self { transport, from })
    }

    fn build_message(&self, mail: OutgoingMail) -> Result<Message, AppError> {
        let to: Mailbox = mail.recipient.parse().map_err(|e: lettre::address::AddressError| {
            AppError::delivery_failure(
                "Invalid recipient address",
                json!({ "reason": e.to_string() }),
            )
        })?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .multipart(MultiPart::alternative_plain_html(
                mail.text_body,
                mail.html_body,
            ))
            .map_err(|e| {
                AppError::delivery_failure(
                    "Failed to build email message",
                    json!({ "reason": e.to_string() }),
                )
            })
    }
}

#[async_trait]
impl Notifier for MailNotifier {
    async fn notify(&self, mail: OutgoingMail) -> Result<(), AppError> {
        let recipient = mail.recipient.clone();
        let message = self.build_message(mail)?;

        let outcome = match &self.transport {
            MailTransport::Smtp(smtp) => smtp
                .send(message)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
            MailTransport::File(file) => file
                .send(message)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
        };

        match outcome {
            Ok(()) => {
                tracing::info!(recipient = %recipient, "Mail sent");
                Ok(())
            }
            Err(reason) => {
                tracing::error!(recipient = %recipient, error = %reason, "Mail delivery failed");
                Err(AppError::delivery_failure(
                    "Failed to send OTP email",
                    json!({}),
                ))
            }
        }
    }
}
