//! Mail transports for the notification digest.

pub mod memory;
pub mod smtp;

use std::sync::Arc;

use publink_core::config::mail::MailConfig;
use publink_core::result::AppResult;
use publink_core::traits::mailer::Mailer;

/// Construct the configured mail transport.
///
/// With mail disabled, digests land in an in-memory sink instead of a
/// relay, which keeps development setups free of SMTP requirements.
pub fn build_mailer(config: &MailConfig) -> AppResult<Arc<dyn Mailer>> {
    if config.enabled {
        Ok(Arc::new(smtp::SmtpMailer::new(config)?))
    } else {
        tracing::info!("Mail sending disabled; digests will not leave the process");
        Ok(Arc::new(memory::MemoryMailer::new()))
    }
}
