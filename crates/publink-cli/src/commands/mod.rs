//! CLI command definitions and dispatch.

use clap::{Parser, Subcommand};

use publink_core::config::AppConfig;
use publink_core::error::AppError;
use publink_worker::{DigestJob, SweepJob};

/// Publink maintenance commands.
#[derive(Debug, Parser)]
#[command(name = "publink-admin", version, about = "Publink maintenance commands")]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "publink.toml", env = "PUBLINK_CONFIG")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Delete share links whose expiry has passed.
    Sweep,
    /// Send download-notification digests and advance the watermark.
    Notify,
}

impl Cli {
    pub async fn execute(self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.config)?;
        let store = publink_storage::build_store(&config.storage).await?;
        store.ensure_volume(&config.storage.share_volume).await?;
        let share_volume = config.storage.share_volume.clone();

        match self.command {
            Commands::Sweep => {
                let report = SweepJob::new(store, share_volume).run().await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
                if report.is_failure() {
                    return Err(AppError::internal(format!(
                        "{} share records failed to sweep",
                        report.failed
                    )));
                }
            }
            Commands::Notify => {
                let mailer = publink_mail::build_mailer(&config.mail)?;
                let report = DigestJob::new(
                    store,
                    mailer,
                    config.mail.clone(),
                    config.server.clone(),
                    share_volume,
                )
                .run()
                .await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Ok(())
    }
}
