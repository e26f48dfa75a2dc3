//! Cron scheduler for the periodic jobs.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use publink_core::config::worker::WorkerConfig;
use publink_core::error::AppError;

use crate::jobs::digest::DigestJob;
use crate::jobs::session::SessionPruneJob;
use crate::jobs::sweep::SweepJob;

/// Cron-based scheduler running the batch jobs in-process.
pub struct CronScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler })
    }

    /// Register all periodic jobs per the worker configuration.
    pub async fn register_jobs(
        &self,
        config: &WorkerConfig,
        sweep: Arc<SweepJob>,
        digest: Arc<DigestJob>,
        prune: Arc<SessionPruneJob>,
    ) -> Result<(), AppError> {
        self.register_sweep(&config.sweep_cron, sweep).await?;
        self.register_digest(&config.digest_cron, digest).await?;
        self.register_session_prune(&config.session_prune_cron, prune)
            .await?;

        tracing::info!("All scheduled jobs registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    async fn register_sweep(&self, cron: &str, sweep: Arc<SweepJob>) -> Result<(), AppError> {
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let sweep = Arc::clone(&sweep);
            Box::pin(async move {
                tracing::debug!("Running scheduled expiry sweep");
                match sweep.run().await {
                    Ok(report) if report.is_failure() => {
                        tracing::error!(failed = report.failed, "Expiry sweep had failures");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("Expiry sweep failed: {e}"),
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create sweep schedule: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add sweep schedule: {e}")))?;

        tracing::info!(cron, "Registered: expiry sweep");
        Ok(())
    }

    async fn register_digest(&self, cron: &str, digest: Arc<DigestJob>) -> Result<(), AppError> {
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let digest = Arc::clone(&digest);
            Box::pin(async move {
                tracing::debug!("Running scheduled notification digest");
                if let Err(e) = digest.run().await {
                    tracing::error!("Notification digest failed: {e}");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create digest schedule: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add digest schedule: {e}")))?;

        tracing::info!(cron, "Registered: notification digest");
        Ok(())
    }

    async fn register_session_prune(
        &self,
        cron: &str,
        prune: Arc<SessionPruneJob>,
    ) -> Result<(), AppError> {
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let prune = Arc::clone(&prune);
            Box::pin(async move {
                tracing::debug!("Running scheduled session prune");
                prune.run();
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create session prune schedule: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add session prune schedule: {e}")))?;

        tracing::info!(cron, "Registered: session prune");
        Ok(())
    }
}
