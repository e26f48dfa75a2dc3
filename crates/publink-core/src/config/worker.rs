//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Scheduled batch-job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the in-process scheduler is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression for the expiry sweep (6-field, seconds first).
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
    /// Cron expression for the notification digest.
    #[serde(default = "default_digest_cron")]
    pub digest_cron: String,
    /// Cron expression for the session-cache prune.
    #[serde(default = "default_prune_cron")]
    pub session_prune_cron: String,
    /// Idle lifetime in seconds for session auth-cache entries.
    #[serde(default = "default_session_idle")]
    pub session_idle_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            sweep_cron: default_sweep_cron(),
            digest_cron: default_digest_cron(),
            session_prune_cron: default_prune_cron(),
            session_idle_seconds: default_session_idle(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Hourly.
fn default_sweep_cron() -> String {
    "0 0 * * * *".to_string()
}

/// Every 15 minutes.
fn default_digest_cron() -> String {
    "0 */15 * * * *".to_string()
}

/// Every 30 minutes.
fn default_prune_cron() -> String {
    "0 */30 * * * *".to_string()
}

fn default_session_idle() -> u64 {
    3600
}
