//! Object-store configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Object-store provider to use: `"s3"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Name of the reserved volume holding share records and markers.
    #[serde(default = "default_share_volume")]
    pub share_volume: String,
    /// S3-compatible object storage configuration.
    #[serde(default)]
    pub s3: S3StorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            share_volume: default_share_volume(),
            s3: S3StorageConfig::default(),
        }
    }
}

/// S3-compatible object storage configuration.
///
/// Volumes map to buckets; each shared path's leading component names the
/// bucket that holds it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct S3StorageConfig {
    /// S3 endpoint URL (for non-AWS clusters like MinIO; empty = AWS).
    #[serde(default)]
    pub endpoint: String,
    /// Region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Access key ID.
    #[serde(default)]
    pub access_key: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_key: String,
    /// Use path-style addressing (required by most S3-compatible clusters).
    #[serde(default = "default_true")]
    pub force_path_style: bool,
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_share_volume() -> String {
    "__sharelinks__".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_true() -> bool {
    true
}
