//! Anonymous access gate for share links.
//!
//! Resolves tokens to records, enforces expiry and passwords, walks
//! directory shares without letting a subpath escape the shared root,
//! and writes download markers for notified shares.
//!
//! Anonymous callers only ever learn "link unavailable". A missing
//! record, a malformed record and a deleted target all collapse into
//! the same NotFound; expiry gets its own message but the same kind.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use publink_auth::PasswordHasher;
use publink_core::error::AppError;
use publink_core::result::AppResult;
use publink_core::traits::store::{ByteStream, ObjectMeta, ObjectStore};
use publink_core::types::pagination::{PageRequest, PageResponse};

use super::marker::{DownloadMarker, marker_key};
use super::record::{ShareRecord, split_volume_path};

/// Coarse file classification for listing display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Source,
    Text,
    Image,
    Other,
}

impl FileKind {
    /// Classify by filename extension.
    pub fn from_name(name: &str) -> Self {
        let ext = name.rsplit('.').next().unwrap_or_default().to_lowercase();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "c" | "h" | "cpp" | "hpp" | "rs" | "py" | "go" | "js" | "ts" | "java" | "sh" => {
                Self::Source
            }
            "txt" | "md" | "log" | "cfg" | "conf" | "json" | "yaml" | "yml" | "toml" | "xml"
            | "csv" => Self::Text,
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "svg" | "webp" => Self::Image,
            _ => Self::Other,
        }
    }
}

/// One entry in a directory-listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingEntry {
    /// Entry name (last path component).
    pub name: String,
    /// Whether the entry is a subdirectory.
    pub is_directory: bool,
    /// Size in bytes (0 for directories).
    pub size_bytes: u64,
    /// Last modified timestamp, when the backend reports one.
    pub last_modified: Option<DateTime<Utc>>,
    /// Display classification.
    pub kind: FileKind,
}

/// What a token (plus optional subpath) points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareTarget {
    Directory { volume: String, prefix: String },
    File { volume: String, key: String, filename: String },
}

/// Validates tokens and serves listings and downloads.
#[derive(Debug, Clone)]
pub struct AccessService {
    store: Arc<dyn ObjectStore>,
    hasher: Arc<PasswordHasher>,
    share_volume: String,
}

impl AccessService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        hasher: Arc<PasswordHasher>,
        share_volume: String,
    ) -> Self {
        Self {
            store,
            hasher,
            share_volume,
        }
    }

    /// Resolves a token to its share record, enforcing expiry and
    /// re-checking that the shared target still exists.
    pub async fn resolve(&self, token: &str) -> AppResult<ShareRecord> {
        self.resolve_at(token, Utc::now()).await
    }

    /// [`resolve`](Self::resolve) with an injected clock.
    pub async fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> AppResult<ShareRecord> {
        let raw = self
            .store
            .get(&self.share_volume, token)
            .await
            .map_err(|e| self.unavailable(token, "record fetch failed", e))?;

        let record: ShareRecord = serde_json::from_slice(&raw).map_err(|e| {
            self.unavailable(token, "record is malformed", AppError::from(e))
        })?;

        if record.is_expired(now) {
            return Err(AppError::not_found("Share link has expired"));
        }

        // The target may have been deleted independently of the link.
        let (volume, key) = split_volume_path(&record.path)
            .map_err(|e| self.unavailable(token, "record path is invalid", e))?;
        let probe = if record.is_dir() || key.is_empty() {
            self.store
                .list_dir(&volume, &key)
                .await
                .map(|entries| !entries.is_empty())
        } else {
            self.store.exists(&volume, &key).await
        };
        let target_alive = match probe {
            Ok(alive) => alive,
            // A deleted volume reads the same as a deleted target.
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e),
        };
        if !target_alive {
            debug!(token, path = %record.path, "Shared target no longer exists");
            return Err(AppError::not_found("Share link not found"));
        }

        Ok(record)
    }

    /// Checks a provided password against the record.
    ///
    /// Records without a password accept anything, including nothing.
    pub fn check_password(&self, record: &ShareRecord, provided: Option<&str>) -> AppResult<()> {
        let Some(hash) = record.password.as_deref().filter(|h| !h.is_empty()) else {
            return Ok(());
        };
        let Some(provided) = provided else {
            return Err(AppError::authentication("Password required"));
        };
        if self.hasher.verify_password(provided, hash)? {
            Ok(())
        } else {
            Err(AppError::authentication("Invalid password"))
        }
    }

    /// Resolves what the token points at, honoring an optional subpath
    /// into directory shares. The subpath can never escape the shared
    /// root.
    pub async fn resolve_target(
        &self,
        record: &ShareRecord,
        subpath: &str,
    ) -> AppResult<ShareTarget> {
        let (volume, root_key) = split_volume_path(&record.path)?;

        if !record.is_dir() {
            if !subpath.is_empty() {
                return Err(AppError::not_found("Share link not found"));
            }
            return Ok(ShareTarget::File {
                volume,
                filename: record.filename.clone(),
                key: root_key,
            });
        }

        let root = root_key.trim_end_matches('/');
        let key = join_subpath(root, subpath)?;
        if key == root || subpath.ends_with('/') {
            return Ok(ShareTarget::Directory {
                volume,
                prefix: key,
            });
        }

        if self.store.exists(&volume, &key).await? {
            let filename = key.rsplit('/').next().unwrap_or(&key).to_string();
            return Ok(ShareTarget::File {
                volume,
                key,
                filename,
            });
        }
        if !self.store.list_dir(&volume, &key).await?.is_empty() {
            return Ok(ShareTarget::Directory {
                volume,
                prefix: key,
            });
        }
        Err(AppError::not_found("Share link not found"))
    }

    /// Lists one page of a shared directory, directories first, then
    /// alphabetical.
    pub async fn list_directory(
        &self,
        volume: &str,
        prefix: &str,
        page: &PageRequest,
    ) -> AppResult<PageResponse<ListingEntry>> {
        let entries = self.store.list_dir(volume, prefix).await?;
        let entries: Vec<ListingEntry> = entries.into_iter().map(to_listing_entry).collect();
        Ok(PageResponse::paginate(entries, page))
    }

    /// Opens a shared file for streaming.
    pub async fn open_download(&self, volume: &str, key: &str) -> AppResult<ByteStream> {
        self.store
            .get_stream(volume, key)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    AppError::not_found("Share link not found")
                } else {
                    e
                }
            })
    }

    /// Writes a download marker when the record carries a notify email.
    ///
    /// `subpath` is the path below the shared root that was downloaded,
    /// empty for direct file shares; the marker records the actual file.
    pub async fn record_download(
        &self,
        record: &ShareRecord,
        token: &str,
        subpath: &str,
        ip: &str,
        user_agent: &str,
    ) -> AppResult<()> {
        let Some(email) = record.notify.as_deref().filter(|e| !e.is_empty()) else {
            return Ok(());
        };

        let path = if subpath.is_empty() {
            record.path.clone()
        } else {
            format!("{}/{}", record.path.trim_end_matches('/'), subpath)
        };
        let marker = DownloadMarker {
            token: token.to_string(),
            path,
            subpath: subpath.to_string(),
            ip: ip.to_string(),
            user_agent: user_agent.to_string(),
        };
        let key = marker_key(email, Utc::now().timestamp());
        let body = Bytes::from(serde_json::to_vec(&marker)?);

        // A lost marker must not break the download itself.
        if let Err(e) = self.store.put(&self.share_volume, &key, body).await {
            warn!(token, error = %e, "Failed to write download marker");
        }
        Ok(())
    }

    fn unavailable(&self, token: &str, reason: &str, source: AppError) -> AppError {
        debug!(token, reason, error = %source, "Share link unavailable");
        AppError::not_found("Share link not found")
    }
}

/// Joins a request subpath onto the shared root key, rejecting any
/// component that would climb out of the subtree.
fn join_subpath(root: &str, subpath: &str) -> AppResult<String> {
    let mut key = root.to_string();
    for component in subpath.split('/') {
        if component.is_empty() {
            continue;
        }
        if component == "." || component == ".." {
            return Err(AppError::not_found("Share link not found"));
        }
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(component);
    }
    Ok(key)
}

fn to_listing_entry(meta: ObjectMeta) -> ListingEntry {
    let name = meta
        .key
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(&meta.key)
        .to_string();
    let kind = if meta.is_directory {
        FileKind::Other
    } else {
        FileKind::from_name(&name)
    };
    ListingEntry {
        name,
        is_directory: meta.is_directory,
        size_bytes: meta.size_bytes,
        last_modified: meta.last_modified,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use publink_core::error::ErrorKind;
    use publink_storage::providers::memory::MemoryObjectStore;

    const SHARE_VOLUME: &str = "__sharelinks__";

    async fn setup() -> (Arc<MemoryObjectStore>, AccessService) {
        let store = Arc::new(MemoryObjectStore::new());
        store.ensure_volume(SHARE_VOLUME).await.unwrap();
        store.ensure_volume("vol").await.unwrap();
        for key in [
            "docs/report.pdf",
            "docs/notes.txt",
            "docs/img/logo.png",
            "docs/src/main.rs",
        ] {
            store.put("vol", key, Bytes::from("data")).await.unwrap();
        }
        let svc = AccessService::new(
            store.clone(),
            Arc::new(PasswordHasher::new()),
            SHARE_VOLUME.to_string(),
        );
        (store, svc)
    }

    async fn put_record(store: &MemoryObjectStore, token: &str, record: &ShareRecord) {
        store
            .put(
                SHARE_VOLUME,
                token,
                Bytes::from(serde_json::to_vec(record).unwrap()),
            )
            .await
            .unwrap();
    }

    fn file_record() -> ShareRecord {
        ShareRecord {
            filename: "report.pdf".to_string(),
            path: "/vol/docs/report.pdf".to_string(),
            expires_on: None,
            password: None,
            notify: None,
        }
    }

    fn dir_record() -> ShareRecord {
        ShareRecord {
            filename: "docs".to_string(),
            path: "/vol/docs/".to_string(),
            expires_on: None,
            password: None,
            notify: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_live_record() {
        let (store, svc) = setup().await;
        put_record(&store, "abc123/report.pdf", &file_record()).await;

        let record = svc.resolve("abc123/report.pdf").await.unwrap();
        assert_eq!(record.path, "/vol/docs/report.pdf");
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_are_uniform_not_found() {
        let (store, svc) = setup().await;

        let err = svc.resolve("missing/token").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Share link not found");

        store
            .put(SHARE_VOLUME, "bad/token", Bytes::from("not json"))
            .await
            .unwrap();
        let err = svc.resolve("bad/token").await.unwrap_err();
        assert_eq!(err.message, "Share link not found");
    }

    #[tokio::test]
    async fn test_expired_record_is_reported_expired() {
        let (store, svc) = setup().await;
        let mut record = file_record();
        record.expires_on = Some(Utc::now().timestamp() + 3600);
        put_record(&store, "abc123/report.pdf", &record).await;

        // Fine now, expired 3601 seconds later.
        assert!(svc.resolve("abc123/report.pdf").await.is_ok());
        let later = Utc::now() + Duration::seconds(3601);
        let err = svc.resolve_at("abc123/report.pdf", later).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Share link has expired");
    }

    #[tokio::test]
    async fn test_expired_wins_over_password() {
        let (store, svc) = setup().await;
        let hash = PasswordHasher::new().hash_password("correct horse").unwrap();
        let mut record = file_record();
        record.password = Some(hash);
        record.expires_on = Some(Utc::now().timestamp() - 10);
        put_record(&store, "abc123/report.pdf", &record).await;

        let err = svc.resolve("abc123/report.pdf").await.unwrap_err();
        assert_eq!(err.message, "Share link has expired");
    }

    #[tokio::test]
    async fn test_deleted_target_makes_link_unavailable() {
        let (store, svc) = setup().await;
        put_record(&store, "abc123/report.pdf", &file_record()).await;

        store.delete("vol", "docs/report.pdf").await.unwrap();
        let err = svc.resolve("abc123/report.pdf").await.unwrap_err();
        assert_eq!(err.message, "Share link not found");
    }

    #[tokio::test]
    async fn test_password_semantics() {
        let (_store, svc) = setup().await;
        let hasher = PasswordHasher::new();

        // No password on the record accepts anything.
        let open = file_record();
        svc.check_password(&open, None).unwrap();
        svc.check_password(&open, Some("whatever")).unwrap();

        let mut locked = file_record();
        locked.password = Some(hasher.hash_password("correct horse").unwrap());
        assert_eq!(
            svc.check_password(&locked, None).unwrap_err().kind,
            ErrorKind::Authentication
        );
        assert_eq!(
            svc.check_password(&locked, Some("wrong")).unwrap_err().kind,
            ErrorKind::Authentication
        );
        svc.check_password(&locked, Some("correct horse")).unwrap();
    }

    #[tokio::test]
    async fn test_subpath_cannot_escape_shared_root() {
        let (_store, svc) = setup().await;
        let record = dir_record();

        for bad in ["../secret", "img/../../etc", ".."] {
            let err = svc.resolve_target(&record, bad).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::NotFound);
        }
    }

    #[tokio::test]
    async fn test_resolve_target_walks_directories_and_files() {
        let (_store, svc) = setup().await;
        let record = dir_record();

        let root = svc.resolve_target(&record, "").await.unwrap();
        assert_eq!(
            root,
            ShareTarget::Directory {
                volume: "vol".to_string(),
                prefix: "docs".to_string(),
            }
        );

        let sub = svc.resolve_target(&record, "img").await.unwrap();
        assert_eq!(
            sub,
            ShareTarget::Directory {
                volume: "vol".to_string(),
                prefix: "docs/img".to_string(),
            }
        );

        let file = svc.resolve_target(&record, "img/logo.png").await.unwrap();
        assert_eq!(
            file,
            ShareTarget::File {
                volume: "vol".to_string(),
                key: "docs/img/logo.png".to_string(),
                filename: "logo.png".to_string(),
            }
        );

        let err = svc.resolve_target(&record, "nope.txt").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_file_share_rejects_subpaths() {
        let (_store, svc) = setup().await;
        let record = file_record();

        assert!(matches!(
            svc.resolve_target(&record, "").await.unwrap(),
            ShareTarget::File { .. }
        ));
        assert!(svc.resolve_target(&record, "anything").await.is_err());
    }

    #[tokio::test]
    async fn test_listing_sorted_and_paginated() {
        let (_store, svc) = setup().await;

        let page = svc
            .list_directory("vol", "docs", &PageRequest::new(1, 20))
            .await
            .unwrap();
        let names: Vec<(&str, bool)> = page
            .items
            .iter()
            .map(|e| (e.name.as_str(), e.is_directory))
            .collect();
        assert_eq!(
            names,
            vec![
                ("img", true),
                ("src", true),
                ("notes.txt", false),
                ("report.pdf", false),
            ]
        );
        assert_eq!(page.total_items, 4);

        let small = svc
            .list_directory("vol", "docs", &PageRequest::new(2, 2))
            .await
            .unwrap();
        assert_eq!(small.items.len(), 2);
        assert!(small.has_previous);
        assert!(!small.has_next);
    }

    #[tokio::test]
    async fn test_listing_kinds() {
        let (_store, svc) = setup().await;
        let page = svc
            .list_directory("vol", "docs", &PageRequest::default())
            .await
            .unwrap();
        let kind_of = |name: &str| {
            page.items
                .iter()
                .find(|e| e.name == name)
                .map(|e| e.kind)
                .unwrap()
        };
        assert_eq!(kind_of("report.pdf"), FileKind::Pdf);
        assert_eq!(kind_of("notes.txt"), FileKind::Text);
    }

    #[tokio::test]
    async fn test_marker_written_only_for_notified_shares() {
        let (store, svc) = setup().await;

        let quiet = file_record();
        svc.record_download(&quiet, "t1/report.pdf", "", "10.0.0.1", "curl/8")
            .await
            .unwrap();
        assert!(store.list_all(SHARE_VOLUME, "notify/").await.unwrap().is_empty());

        let mut notified = file_record();
        notified.notify = Some("ops@example.com".to_string());
        svc.record_download(&notified, "t2/report.pdf", "", "10.0.0.2", "curl/8")
            .await
            .unwrap();

        let markers = store.list_all(SHARE_VOLUME, "notify/").await.unwrap();
        assert_eq!(markers.len(), 1);
        let raw = store.get(SHARE_VOLUME, &markers[0].key).await.unwrap();
        let marker: DownloadMarker = serde_json::from_slice(&raw).unwrap();
        assert_eq!(marker.token, "t2/report.pdf");
        assert_eq!(marker.path, "/vol/docs/report.pdf");
        assert!(marker.subpath.is_empty());
        assert_eq!(marker.ip, "10.0.0.2");
    }

    #[tokio::test]
    async fn test_marker_records_the_file_inside_a_directory_share() {
        let (store, svc) = setup().await;

        let mut record = dir_record();
        record.notify = Some("ops@example.com".to_string());
        svc.record_download(&record, "t3/docs", "img/logo.png", "10.0.0.3", "curl/8")
            .await
            .unwrap();

        let markers = store.list_all(SHARE_VOLUME, "notify/").await.unwrap();
        let raw = store.get(SHARE_VOLUME, &markers[0].key).await.unwrap();
        let marker: DownloadMarker = serde_json::from_slice(&raw).unwrap();
        // The downloaded file, not the shared root.
        assert_eq!(marker.path, "/vol/docs/img/logo.png");
        assert_eq!(marker.subpath, "img/logo.png");
    }
}
