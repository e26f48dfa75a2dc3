//! Object-store client adapters for Publink.
//!
//! The [`ObjectStore`](publink_core::traits::store::ObjectStore) trait is
//! defined in `publink-core`; this crate provides the S3 implementation used
//! against real clusters and an in-memory implementation used by tests and
//! single-process development setups.

pub mod providers;

use std::sync::Arc;

use publink_core::config::storage::StorageConfig;
use publink_core::error::AppError;
use publink_core::result::AppResult;
use publink_core::traits::store::ObjectStore;

/// Construct the configured object-store provider.
pub async fn build_store(config: &StorageConfig) -> AppResult<Arc<dyn ObjectStore>> {
    match config.provider.as_str() {
        "memory" => Ok(Arc::new(providers::memory::MemoryObjectStore::new())),
        #[cfg(feature = "s3")]
        "s3" => {
            let store = providers::s3::S3ObjectStore::new(&config.s3).await?;
            Ok(Arc::new(store))
        }
        other => Err(AppError::configuration(format!(
            "Unknown storage provider: '{other}'"
        ))),
    }
}
