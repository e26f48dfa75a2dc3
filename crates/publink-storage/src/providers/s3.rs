//! S3-compatible object-store provider.
//!
//! Volumes map to buckets and volume custom metadata maps to bucket
//! tagging. `put_if_absent` uses `If-None-Match: *` so token uniqueness
//! rides on the cluster's conditional-write support instead of a
//! probe-then-write race.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream as S3Body;
use aws_sdk_s3::types::{Tag, Tagging};
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::debug;

use publink_core::config::storage::S3StorageConfig;
use publink_core::error::AppError;
use publink_core::result::AppResult;
use publink_core::traits::store::{ByteStream, ObjectMeta, ObjectStore};

/// S3-compatible object store client.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Create a new S3 object store from configuration.
    pub async fn new(config: &S3StorageConfig) -> AppResult<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if !config.access_key.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "publink-config",
            ));
        }
        if !config.endpoint.is_empty() {
            loader = loader.endpoint_url(config.endpoint.clone());
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();

        tracing::info!(
            endpoint = %config.endpoint,
            region = %config.region,
            "Initialized S3 object store"
        );

        Ok(Self {
            client: Client::from_conf(s3_config),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn volume_exists(&self, volume: &str) -> AppResult<bool> {
        match self.client.head_bucket().bucket(volume).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let msg = format!("head_bucket '{volume}' failed: {err}");
                if err.into_service_error().is_not_found() {
                    Ok(false)
                } else {
                    Err(AppError::storage(msg))
                }
            }
        }
    }

    async fn ensure_volume(&self, volume: &str) -> AppResult<()> {
        match self.client.create_bucket().bucket(volume).send().await {
            Ok(_) => {
                debug!(volume, "Created volume");
                Ok(())
            }
            Err(err) => {
                let msg = format!("create_bucket '{volume}' failed: {err}");
                let svc = err.into_service_error();
                if svc.is_bucket_already_owned_by_you() || svc.is_bucket_already_exists() {
                    Ok(())
                } else {
                    Err(AppError::storage(msg))
                }
            }
        }
    }

    async fn exists(&self, volume: &str, key: &str) -> AppResult<bool> {
        match self
            .client
            .head_object()
            .bucket(volume)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let msg = format!("head_object '{key}' failed: {err}");
                if err.into_service_error().is_not_found() {
                    Ok(false)
                } else {
                    Err(AppError::storage(msg))
                }
            }
        }
    }

    async fn get(&self, volume: &str, key: &str) -> AppResult<Bytes> {
        let resp = self
            .client
            .get_object()
            .bucket(volume)
            .key(key)
            .send()
            .await
            .map_err(|err| map_get_error(key, err))?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| AppError::storage(format!("Failed to read object body: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn get_stream(&self, volume: &str, key: &str) -> AppResult<ByteStream> {
        let resp = self
            .client
            .get_object()
            .bucket(volume)
            .key(key)
            .send()
            .await
            .map_err(|err| map_get_error(key, err))?;

        let reader = resp.body.into_async_read();
        Ok(Box::pin(ReaderStream::new(reader)))
    }

    async fn put(&self, volume: &str, key: &str, data: Bytes) -> AppResult<()> {
        self.client
            .put_object()
            .bucket(volume)
            .key(key)
            .body(S3Body::from(data))
            .send()
            .await
            .map_err(|err| AppError::storage(format!("put_object '{key}' failed: {err}")))?;
        Ok(())
    }

    async fn put_if_absent(&self, volume: &str, key: &str, data: Bytes) -> AppResult<bool> {
        match self
            .client
            .put_object()
            .bucket(volume)
            .key(key)
            .if_none_match("*")
            .body(S3Body::from(data))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                // 412 means the key is already taken.
                if let SdkError::ServiceError(ref se) = err {
                    if se.raw().status().as_u16() == 412 {
                        return Ok(false);
                    }
                }
                Err(AppError::storage(format!(
                    "conditional put_object '{key}' failed: {err}"
                )))
            }
        }
    }

    async fn delete(&self, volume: &str, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(volume)
            .key(key)
            .send()
            .await
            .map_err(|err| AppError::storage(format!("delete_object '{key}' failed: {err}")))?;
        Ok(())
    }

    async fn list_dir(&self, volume: &str, prefix: &str) -> AppResult<Vec<ObjectMeta>> {
        let prefix = normalize_dir_prefix(prefix);
        let mut entries: Vec<ObjectMeta> = Vec::new();

        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(volume)
            .prefix(&prefix)
            .delimiter("/")
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page
                .map_err(|err| AppError::storage(format!("list_objects_v2 failed: {err}")))?;

            for cp in page.common_prefixes() {
                if let Some(p) = cp.prefix() {
                    entries.push(ObjectMeta {
                        key: p.to_string(),
                        size_bytes: 0,
                        last_modified: None,
                        is_directory: true,
                    });
                }
            }
            for obj in page.contents() {
                let Some(key) = obj.key() else { continue };
                // Skip the directory placeholder object itself.
                if key == prefix {
                    continue;
                }
                entries.push(ObjectMeta {
                    key: key.to_string(),
                    size_bytes: obj.size().unwrap_or(0).max(0) as u64,
                    last_modified: obj.last_modified().and_then(to_chrono),
                    is_directory: false,
                });
            }
        }

        entries.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then(a.key.cmp(&b.key))
        });
        Ok(entries)
    }

    async fn list_all(&self, volume: &str, prefix: &str) -> AppResult<Vec<ObjectMeta>> {
        let prefix = prefix.trim_start_matches('/').to_string();
        let mut entries: Vec<ObjectMeta> = Vec::new();

        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(volume)
            .prefix(&prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page
                .map_err(|err| AppError::storage(format!("list_objects_v2 failed: {err}")))?;
            for obj in page.contents() {
                let Some(key) = obj.key() else { continue };
                entries.push(ObjectMeta {
                    key: key.to_string(),
                    size_bytes: obj.size().unwrap_or(0).max(0) as u64,
                    last_modified: obj.last_modified().and_then(to_chrono),
                    is_directory: false,
                });
            }
        }

        Ok(entries)
    }

    async fn get_volume_meta(&self, volume: &str) -> AppResult<HashMap<String, String>> {
        match self
            .client
            .get_bucket_tagging()
            .bucket(volume)
            .send()
            .await
        {
            Ok(out) => Ok(out
                .tag_set()
                .iter()
                .map(|t| (t.key().to_string(), t.value().to_string()))
                .collect()),
            Err(err) => {
                let msg = format!("get_bucket_tagging '{volume}' failed: {err}");
                let svc = err.into_service_error();
                // A volume with no tags yet is just an empty map.
                if svc.meta().code() == Some("NoSuchTagSet") {
                    Ok(HashMap::new())
                } else {
                    Err(AppError::storage(msg))
                }
            }
        }
    }

    async fn set_volume_meta(
        &self,
        volume: &str,
        meta: HashMap<String, String>,
    ) -> AppResult<()> {
        let mut tags = Vec::with_capacity(meta.len());
        for (key, value) in meta {
            let tag = Tag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(|e| AppError::internal(format!("Invalid volume meta tag: {e}")))?;
            tags.push(tag);
        }

        let tagging = Tagging::builder()
            .set_tag_set(Some(tags))
            .build()
            .map_err(|e| AppError::internal(format!("Invalid volume meta tag set: {e}")))?;

        self.client
            .put_bucket_tagging()
            .bucket(volume)
            .tagging(tagging)
            .send()
            .await
            .map_err(|err| {
                AppError::storage(format!("put_bucket_tagging '{volume}' failed: {err}"))
            })?;
        Ok(())
    }
}

fn map_get_error(
    key: &str,
    err: SdkError<aws_sdk_s3::operation::get_object::GetObjectError>,
) -> AppError {
    let msg = format!("get_object '{key}' failed: {err}");
    if err.into_service_error().is_no_such_key() {
        AppError::not_found(format!("Object not found: {key}"))
    } else {
        AppError::storage(msg)
    }
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

fn normalize_dir_prefix(prefix: &str) -> String {
    let p = prefix.trim_start_matches('/');
    if p.is_empty() {
        String::new()
    } else {
        format!("{}/", p.trim_end_matches('/'))
    }
}
