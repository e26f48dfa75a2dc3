//! Mail transport trait for outgoing digest messages.

use async_trait::async_trait;

use crate::result::AppResult;

/// A plain-text outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Mail transport consumed by the notification digest job.
///
/// The SMTP implementation lives in `publink-mail`; tests use the
/// in-memory recording transport from the same crate.
#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug + 'static {
    /// Send one message. Errors are per-recipient; the digest job logs and
    /// skips failures rather than aborting the batch.
    async fn send(&self, mail: &OutgoingMail) -> AppResult<()>;
}
