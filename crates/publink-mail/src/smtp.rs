//! SMTP transport via lettre.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use publink_core::error::AppError;
use publink_core::result::AppResult;
use publink_core::traits::mailer::{Mailer, OutgoingMail};

/// Sends plain-text digests through an SMTP relay.
#[derive(Debug)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &publink_core::config::mail::MailConfig) -> AppResult<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| {
                AppError::configuration(format!(
                    "Invalid SMTP relay '{}': {e}",
                    config.smtp_host
                ))
            })?
            .port(config.smtp_port);

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        let from: Mailbox = config.from_address.parse().map_err(|e| {
            AppError::configuration(format!(
                "Invalid from address '{}': {e}",
                config.from_address
            ))
        })?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> AppResult<()> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| AppError::validation(format!("Invalid recipient '{}': {e}", mail.to)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| AppError::internal(format!("Failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::external_service(format!("SMTP send failed: {e}")))?;

        debug!(to = %mail.to, "Digest sent");
        Ok(())
    }
}
