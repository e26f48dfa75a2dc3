//! Mail transport configuration for the notification digest.

use serde::{Deserialize, Serialize};

/// SMTP and digest message settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Whether digest mail sending is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// SMTP relay hostname.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username (empty = unauthenticated).
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address for digest messages.
    #[serde(default = "default_from")]
    pub from_address: String,
    /// Digest message subject line.
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Optional plain-text file prepended to every digest.
    #[serde(default)]
    pub head_file: Option<String>,
    /// Optional plain-text file appended to every digest.
    #[serde(default)]
    pub tail_file: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: default_from(),
            subject: default_subject(),
            head_file: None,
            tail_file: None,
        }
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    25
}

fn default_from() -> String {
    "noreply@localhost".to_string()
}

fn default_subject() -> String {
    "Your shared files were downloaded".to_string()
}
