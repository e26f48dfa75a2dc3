//! Share creation service.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use tracing::info;

use publink_auth::PasswordHasher;
use publink_core::config::share::ShareConfig;
use publink_core::error::AppError;
use publink_core::result::AppResult;
use publink_core::traits::store::ObjectStore;

use super::record::{ShareRecord, filename_of, split_volume_path};
use super::token::{build_token, generate_prefix};

/// Request to create a new share link.
#[derive(Debug, Clone)]
pub struct CreateShare {
    /// Storage path, `/<volume>/<key...>`; trailing slash shares a
    /// directory.
    pub path: String,
    /// Seconds until expiry, relative to now. `None` never expires.
    pub expire_time: Option<i64>,
    /// Optional share password (plaintext; hashed before storage).
    pub password: Option<String>,
    /// Optional email to notify about downloads.
    pub notify: Option<String>,
}

/// Creates share records in the share-links volume.
#[derive(Debug, Clone)]
pub struct ShareService {
    store: Arc<dyn ObjectStore>,
    hasher: Arc<PasswordHasher>,
    config: ShareConfig,
    share_volume: String,
}

impl ShareService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        hasher: Arc<PasswordHasher>,
        config: ShareConfig,
        share_volume: String,
    ) -> Self {
        Self {
            store,
            hasher,
            config,
            share_volume,
        }
    }

    /// Creates a share and returns its token.
    ///
    /// Validates the target, builds the metadata record, then claims a
    /// unique token with conditional writes under an explicit deadline.
    pub async fn create_share(&self, req: CreateShare) -> AppResult<String> {
        let (volume, key) = split_volume_path(&req.path)?;

        if volume == self.share_volume {
            return Err(AppError::validation("Cannot share the share-links volume"));
        }
        if let Some(ref password) = req.password {
            if password.len() < self.config.min_password_length {
                return Err(AppError::validation(format!(
                    "Password must be at least {} characters",
                    self.config.min_password_length
                )));
            }
        }

        if !self.store.volume_exists(&volume).await? {
            return Err(AppError::validation(format!("No such volume: {volume}")));
        }
        self.check_target_exists(&volume, &key, req.path.ends_with('/'))
            .await?;

        let password_hash = match req.password {
            Some(ref password) => Some(self.hasher.hash_password(password)?),
            None => None,
        };

        let record = ShareRecord {
            filename: filename_of(&req.path).to_string(),
            path: req.path.clone(),
            expires_on: req.expire_time.map(|secs| Utc::now().timestamp() + secs),
            password: password_hash,
            notify: req.notify.clone(),
        };
        let body = Bytes::from(serde_json::to_vec(&record)?);

        let deadline = Duration::from_secs(self.config.create_timeout_seconds);
        let token = tokio::time::timeout(deadline, self.claim_token(&record.filename, body))
            .await
            .map_err(|_| AppError::timeout("Timed out generating a unique share token"))??;

        info!(
            token = %token,
            path = %req.path,
            expires_on = ?record.expires_on,
            notify = ?record.notify,
            "Share created"
        );

        Ok(token)
    }

    /// Generate candidate tokens until a conditional write wins.
    async fn claim_token(&self, filename: &str, body: Bytes) -> AppResult<String> {
        loop {
            let token = build_token(&generate_prefix(self.config.token_length), filename);
            if self
                .store
                .put_if_absent(&self.share_volume, &token, body.clone())
                .await?
            {
                return Ok(token);
            }
        }
    }

    async fn check_target_exists(&self, volume: &str, key: &str, is_dir: bool) -> AppResult<()> {
        let exists = if is_dir || key.is_empty() {
            // A directory exists when anything lives under its prefix.
            !self.store.list_dir(volume, key).await?.is_empty()
        } else {
            self.store.exists(volume, key).await?
        };
        if !exists {
            return Err(AppError::validation(format!(
                "No such path in volume {volume}: /{key}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use publink_storage::providers::memory::MemoryObjectStore;

    const SHARE_VOLUME: &str = "__sharelinks__";

    async fn service() -> (Arc<MemoryObjectStore>, ShareService) {
        let store = Arc::new(MemoryObjectStore::new());
        store.ensure_volume(SHARE_VOLUME).await.unwrap();
        store.ensure_volume("vol").await.unwrap();
        store
            .put("vol", "dir/report.pdf", Bytes::from("%PDF"))
            .await
            .unwrap();

        let svc = ShareService::new(
            store.clone(),
            Arc::new(PasswordHasher::new()),
            ShareConfig::default(),
            SHARE_VOLUME.to_string(),
        );
        (store, svc)
    }

    fn request(path: &str) -> CreateShare {
        CreateShare {
            path: path.to_string(),
            expire_time: None,
            password: None,
            notify: None,
        }
    }

    #[tokio::test]
    async fn test_create_share_round_trip() {
        let (store, svc) = service().await;

        let token = svc.create_share(request("/vol/dir/report.pdf")).await.unwrap();
        assert!(token.ends_with("/report.pdf"));

        let raw = store.get(SHARE_VOLUME, &token).await.unwrap();
        let record: ShareRecord = serde_json::from_slice(&raw).unwrap();
        assert_eq!(record.path, "/vol/dir/report.pdf");
        assert_eq!(record.filename, "report.pdf");
        assert!(record.expires_on.is_none());
        assert!(!record.has_password());
    }

    #[tokio::test]
    async fn test_expiry_offset_is_applied() {
        let (store, svc) = service().await;

        let before = Utc::now().timestamp();
        let mut req = request("/vol/dir/report.pdf");
        req.expire_time = Some(3600);
        let token = svc.create_share(req).await.unwrap();

        let raw = store.get(SHARE_VOLUME, &token).await.unwrap();
        let record: ShareRecord = serde_json::from_slice(&raw).unwrap();
        let expires_on = record.expires_on.unwrap();
        assert!(expires_on >= before + 3600);
        assert!(expires_on <= Utc::now().timestamp() + 3600);
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let (store, svc) = service().await;

        let mut req = request("/vol/dir/report.pdf");
        req.password = Some("correct horse".to_string());
        let token = svc.create_share(req).await.unwrap();

        let raw = store.get(SHARE_VOLUME, &token).await.unwrap();
        let record: ShareRecord = serde_json::from_slice(&raw).unwrap();
        let hash = record.password.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(PasswordHasher::new()
            .verify_password("correct horse", &hash)
            .unwrap());
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let (_store, svc) = service().await;

        let mut req = request("/vol/dir/report.pdf");
        req.password = Some("short".to_string());
        let err = svc.create_share(req).await.unwrap_err();
        assert_eq!(err.kind, publink_core::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_missing_volume_and_path_rejected() {
        let (_store, svc) = service().await;

        let err = svc.create_share(request("/nope/file.txt")).await.unwrap_err();
        assert_eq!(err.kind, publink_core::error::ErrorKind::Validation);

        let err = svc.create_share(request("/vol/missing.txt")).await.unwrap_err();
        assert_eq!(err.kind, publink_core::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_directory_share() {
        let (store, svc) = service().await;

        let token = svc.create_share(request("/vol/dir/")).await.unwrap();
        assert!(token.ends_with("/dir"));

        let raw = store.get(SHARE_VOLUME, &token).await.unwrap();
        let record: ShareRecord = serde_json::from_slice(&raw).unwrap();
        assert!(record.is_dir());
    }

    #[tokio::test]
    async fn test_cannot_share_reserved_volume() {
        let (_store, svc) = service().await;
        let err = svc
            .create_share(request("/__sharelinks__/anything"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, publink_core::error::ErrorKind::Validation);
    }
}
