//! Object-store trait for the remote storage cluster.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// Metadata about a stored object or listing prefix.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ObjectMeta {
    /// Key within the volume. Directory prefixes end with `/`.
    pub key: String,
    /// Size in bytes (0 for directory prefixes).
    pub size_bytes: u64,
    /// Last modified timestamp, when the backend reports one.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
    /// Whether this entry is a directory prefix.
    pub is_directory: bool,
}

/// A byte stream type used for reading object contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Client adapter for the remote object-storage cluster.
///
/// Volumes are the cluster's named containers (buckets on S3). The wire
/// protocol and the cluster's replication model belong to the backing
/// client library; this trait only names the calls Publink makes.
/// Implementations live in `publink-storage`.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g. "s3", "memory").
    fn provider_type(&self) -> &str;

    /// Check whether a volume exists.
    async fn volume_exists(&self, volume: &str) -> AppResult<bool>;

    /// Create a volume if it does not already exist.
    async fn ensure_volume(&self, volume: &str) -> AppResult<()>;

    /// Check whether an object exists at the given key.
    async fn exists(&self, volume: &str, key: &str) -> AppResult<bool>;

    /// Read an object into memory. NotFound if absent.
    async fn get(&self, volume: &str, key: &str) -> AppResult<Bytes>;

    /// Read an object as a byte stream. NotFound if absent.
    async fn get_stream(&self, volume: &str, key: &str) -> AppResult<ByteStream>;

    /// Write an object, overwriting any existing one.
    async fn put(&self, volume: &str, key: &str, data: Bytes) -> AppResult<()>;

    /// Write an object only if the key is vacant. Returns `false` without
    /// writing when an object already exists. This is the conditional-write
    /// primitive backing token uniqueness.
    async fn put_if_absent(&self, volume: &str, key: &str, data: Bytes) -> AppResult<bool>;

    /// Delete an object. Deleting an absent key is not an error.
    async fn delete(&self, volume: &str, key: &str) -> AppResult<()>;

    /// List the immediate children of a directory prefix (delimited
    /// listing). Directory prefixes are reported with `is_directory`.
    async fn list_dir(&self, volume: &str, prefix: &str) -> AppResult<Vec<ObjectMeta>>;

    /// List every object under a prefix, recursively.
    async fn list_all(&self, volume: &str, prefix: &str) -> AppResult<Vec<ObjectMeta>>;

    /// Read the volume's custom metadata map.
    async fn get_volume_meta(&self, volume: &str) -> AppResult<HashMap<String, String>>;

    /// Replace the volume's custom metadata map.
    async fn set_volume_meta(
        &self,
        volume: &str,
        meta: HashMap<String, String>,
    ) -> AppResult<()>;
}
