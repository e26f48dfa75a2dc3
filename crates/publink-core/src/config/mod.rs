//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Because the file carries cluster credentials and SMTP secrets,
//! the loader refuses files readable by group or others.

pub mod logging;
pub mod mail;
pub mod server;
pub mod share;
pub mod storage;
pub mod worker;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::mail::MailConfig;
use self::server::ServerConfig;
use self::share::ShareConfig;
use self::storage::StorageConfig;
use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration file plus the `PUBLINK_` environment overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object-store connection settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Share-link lifecycle settings.
    #[serde(default)]
    pub share: ShareConfig,
    /// Mail transport settings for the notification digest.
    #[serde(default)]
    pub mail: MailConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file merged with environment
    /// variables prefixed with `PUBLINK_` (double-underscore separated,
    /// e.g. `PUBLINK_SERVER__PORT=9000`).
    pub fn load(path: &str) -> Result<Self, AppError> {
        if std::path::Path::new(path).exists() {
            check_permissions(path)?;
        }

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("PUBLINK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            share: ShareConfig::default(),
            mail: MailConfig::default(),
            worker: WorkerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Reject configuration files readable by group or others.
///
/// The file holds the cluster access key and SMTP credentials.
#[cfg(unix)]
fn check_permissions(path: &str) -> Result<(), AppError> {
    use std::os::unix::fs::PermissionsExt;

    let meta = std::fs::metadata(path)
        .map_err(|e| AppError::configuration(format!("Cannot stat config file '{path}': {e}")))?;
    let mode = meta.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(AppError::configuration(format!(
            "Config file '{path}' must not be accessible by group/others (chmod 600 it)"
        )));
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_permissions(_path: &str) -> Result<(), AppError> {
    Ok(())
}
