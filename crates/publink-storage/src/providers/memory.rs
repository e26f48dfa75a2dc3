//! In-memory object store.
//!
//! Backs tests and single-process development. Conditional writes are
//! atomic under the volume lock, so the token-uniqueness guarantee holds
//! exactly as it does on a conditional-write-capable cluster.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use publink_core::error::AppError;
use publink_core::result::AppResult;
use publink_core::traits::store::{ByteStream, ObjectMeta, ObjectStore};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Volume {
    objects: BTreeMap<String, StoredObject>,
    meta: HashMap<String, String>,
}

/// In-memory object store keyed by volume name.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    volumes: Mutex<HashMap<String, Volume>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_volume<T>(
        &self,
        volume: &str,
        f: impl FnOnce(&mut Volume) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut volumes = self
            .volumes
            .lock()
            .map_err(|_| AppError::internal("Memory store lock poisoned"))?;
        let vol = volumes
            .get_mut(volume)
            .ok_or_else(|| AppError::not_found(format!("No such volume: {volume}")))?;
        f(vol)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn volume_exists(&self, volume: &str) -> AppResult<bool> {
        let volumes = self
            .volumes
            .lock()
            .map_err(|_| AppError::internal("Memory store lock poisoned"))?;
        Ok(volumes.contains_key(volume))
    }

    async fn ensure_volume(&self, volume: &str) -> AppResult<()> {
        let mut volumes = self
            .volumes
            .lock()
            .map_err(|_| AppError::internal("Memory store lock poisoned"))?;
        volumes.entry(volume.to_string()).or_default();
        Ok(())
    }

    async fn exists(&self, volume: &str, key: &str) -> AppResult<bool> {
        self.with_volume(volume, |vol| Ok(vol.objects.contains_key(key)))
    }

    async fn get(&self, volume: &str, key: &str) -> AppResult<Bytes> {
        self.with_volume(volume, |vol| {
            vol.objects
                .get(key)
                .map(|o| o.data.clone())
                .ok_or_else(|| AppError::not_found(format!("Object not found: {key}")))
        })
    }

    async fn get_stream(&self, volume: &str, key: &str) -> AppResult<ByteStream> {
        let data = self.get(volume, key).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(data) })))
    }

    async fn put(&self, volume: &str, key: &str, data: Bytes) -> AppResult<()> {
        self.with_volume(volume, |vol| {
            vol.objects.insert(
                key.to_string(),
                StoredObject {
                    data,
                    last_modified: Utc::now(),
                },
            );
            Ok(())
        })
    }

    async fn put_if_absent(&self, volume: &str, key: &str, data: Bytes) -> AppResult<bool> {
        self.with_volume(volume, |vol| {
            if vol.objects.contains_key(key) {
                return Ok(false);
            }
            vol.objects.insert(
                key.to_string(),
                StoredObject {
                    data,
                    last_modified: Utc::now(),
                },
            );
            Ok(true)
        })
    }

    async fn delete(&self, volume: &str, key: &str) -> AppResult<()> {
        self.with_volume(volume, |vol| {
            vol.objects.remove(key);
            Ok(())
        })
    }

    async fn list_dir(&self, volume: &str, prefix: &str) -> AppResult<Vec<ObjectMeta>> {
        let prefix = normalize_dir_prefix(prefix);
        self.with_volume(volume, |vol| {
            let mut entries: Vec<ObjectMeta> = Vec::new();
            let mut seen_dirs: std::collections::HashSet<String> = std::collections::HashSet::new();

            for (key, obj) in vol.objects.range(prefix.clone()..) {
                if !key.starts_with(&prefix) {
                    break;
                }
                let rest = &key[prefix.len()..];
                if rest.is_empty() {
                    continue;
                }
                match rest.split_once('/') {
                    Some((child, _)) => {
                        let dir_key = format!("{prefix}{child}/");
                        if seen_dirs.insert(dir_key.clone()) {
                            entries.push(ObjectMeta {
                                key: dir_key,
                                size_bytes: 0,
                                last_modified: None,
                                is_directory: true,
                            });
                        }
                    }
                    None => entries.push(ObjectMeta {
                        key: key.clone(),
                        size_bytes: obj.data.len() as u64,
                        last_modified: Some(obj.last_modified),
                        is_directory: false,
                    }),
                }
            }

            entries.sort_by(|a, b| {
                b.is_directory
                    .cmp(&a.is_directory)
                    .then(a.key.cmp(&b.key))
            });
            Ok(entries)
        })
    }

    async fn list_all(&self, volume: &str, prefix: &str) -> AppResult<Vec<ObjectMeta>> {
        let prefix = prefix.trim_start_matches('/').to_string();
        self.with_volume(volume, |vol| {
            let entries = vol
                .objects
                .range(prefix.clone()..)
                .take_while(|(key, _)| key.starts_with(&prefix))
                .map(|(key, obj)| ObjectMeta {
                    key: key.clone(),
                    size_bytes: obj.data.len() as u64,
                    last_modified: Some(obj.last_modified),
                    is_directory: false,
                })
                .collect();
            Ok(entries)
        })
    }

    async fn get_volume_meta(&self, volume: &str) -> AppResult<HashMap<String, String>> {
        self.with_volume(volume, |vol| Ok(vol.meta.clone()))
    }

    async fn set_volume_meta(
        &self,
        volume: &str,
        meta: HashMap<String, String>,
    ) -> AppResult<()> {
        self.with_volume(volume, |vol| {
            vol.meta = meta;
            Ok(())
        })
    }
}

/// Normalize a listing prefix: strip any leading slash, ensure a single
/// trailing slash unless the prefix is the volume root.
fn normalize_dir_prefix(prefix: &str) -> String {
    let p = prefix.trim_start_matches('/');
    if p.is_empty() {
        String::new()
    } else {
        format!("{}/", p.trim_end_matches('/'))
    }
}
