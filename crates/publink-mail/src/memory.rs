//! In-memory recording transport for tests and mail-less deployments.

use std::sync::Mutex;

use async_trait::async_trait;

use publink_core::error::AppError;
use publink_core::result::AppResult;
use publink_core::traits::mailer::{Mailer, OutgoingMail};

/// Records every message instead of sending it. Recipients listed in
/// `fail_for` simulate per-recipient transport failures.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail_for: Mutex<Vec<String>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sends to `recipient` fail.
    pub fn fail_for(&self, recipient: &str) {
        self.fail_for
            .lock()
            .expect("mailer lock poisoned")
            .push(recipient.to_string());
    }

    /// All messages recorded so far.
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().expect("mailer lock poisoned").clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: &OutgoingMail) -> AppResult<()> {
        let failing = self.fail_for.lock().expect("mailer lock poisoned");
        if failing.iter().any(|r| r == &mail.to) {
            return Err(AppError::external_service(format!(
                "Simulated send failure for {}",
                mail.to
            )));
        }
        drop(failing);

        self.sent
            .lock()
            .expect("mailer lock poisoned")
            .push(mail.clone());
        Ok(())
    }
}
