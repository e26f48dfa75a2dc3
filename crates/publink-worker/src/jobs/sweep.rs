//! Expiry sweep job.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use publink_core::result::AppResult;
use publink_core::traits::store::ObjectStore;
use publink_service::share::marker::MARKER_PREFIX;
use publink_service::share::record::ShareRecord;

/// Outcome of one sweep run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SweepReport {
    /// Share records examined.
    pub scanned: usize,
    /// Expired records deleted.
    pub deleted: usize,
    /// Expired records that could not be deleted.
    pub failed: usize,
}

impl SweepReport {
    /// Any failure marks the whole run as failed for the operator.
    pub fn is_failure(&self) -> bool {
        self.failed > 0
    }
}

/// Deletes share records whose expiry has passed.
#[derive(Clone)]
pub struct SweepJob {
    store: Arc<dyn ObjectStore>,
    share_volume: String,
}

impl SweepJob {
    pub fn new(store: Arc<dyn ObjectStore>, share_volume: String) -> Self {
        Self {
            store,
            share_volume,
        }
    }

    pub async fn run(&self) -> AppResult<SweepReport> {
        self.run_at(Utc::now()).await
    }

    /// [`run`](Self::run) with an injected clock.
    pub async fn run_at(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let mut report = SweepReport::default();

        let objects = self.store.list_all(&self.share_volume, "").await?;
        for object in objects {
            // Markers live in the same volume but belong to the digest job.
            if object.key.starts_with(MARKER_PREFIX) {
                continue;
            }
            report.scanned += 1;

            let record: ShareRecord = match self
                .store
                .get(&self.share_volume, &object.key)
                .await
                .and_then(|raw| Ok(serde_json::from_slice(&raw)?))
            {
                Ok(record) => record,
                Err(e) => {
                    // Left for manual cleanup; one corrupt record must not
                    // keep every future sweep failing.
                    warn!(token = %object.key, error = %e, "Skipping unreadable share record");
                    continue;
                }
            };

            if !record.is_expired(now) {
                continue;
            }
            match self.store.delete(&self.share_volume, &object.key).await {
                Ok(()) => {
                    info!(token = %object.key, path = %record.path, "Deleted expired share");
                    report.deleted += 1;
                }
                Err(e) => {
                    warn!(token = %object.key, error = %e, "Failed to delete expired share");
                    report.failed += 1;
                }
            }
        }

        info!(
            scanned = report.scanned,
            deleted = report.deleted,
            failed = report.failed,
            "Expiry sweep finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use publink_storage::providers::memory::MemoryObjectStore;

    const SHARE_VOLUME: &str = "__sharelinks__";

    async fn put_record(store: &MemoryObjectStore, token: &str, expires_on: Option<i64>) {
        let record = ShareRecord {
            filename: "f.txt".to_string(),
            path: "/vol/f.txt".to_string(),
            expires_on,
            password: None,
            notify: None,
        };
        store
            .put(
                SHARE_VOLUME,
                token,
                Bytes::from(serde_json::to_vec(&record).unwrap()),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_deletes_exactly_the_expired() {
        let store = Arc::new(MemoryObjectStore::new());
        store.ensure_volume(SHARE_VOLUME).await.unwrap();

        let now = Utc::now();
        let past = now.timestamp() - 60;
        let future = now.timestamp() + 3600;

        put_record(&store, "aaa/f.txt", Some(past)).await;
        put_record(&store, "bbb/f.txt", Some(past)).await;
        put_record(&store, "ccc/f.txt", Some(future)).await;
        put_record(&store, "ddd/f.txt", None).await;

        let report = SweepJob::new(store.clone(), SHARE_VOLUME.to_string())
            .run_at(now)
            .await
            .unwrap();

        assert_eq!(report.scanned, 4);
        assert_eq!(report.deleted, 2);
        assert_eq!(report.failed, 0);
        assert!(!report.is_failure());

        assert!(!store.exists(SHARE_VOLUME, "aaa/f.txt").await.unwrap());
        assert!(!store.exists(SHARE_VOLUME, "bbb/f.txt").await.unwrap());
        assert!(store.exists(SHARE_VOLUME, "ccc/f.txt").await.unwrap());
        assert!(store.exists(SHARE_VOLUME, "ddd/f.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_ignores_markers_and_skips_bad_records() {
        let store = Arc::new(MemoryObjectStore::new());
        store.ensure_volume(SHARE_VOLUME).await.unwrap();

        put_record(&store, "aaa/f.txt", None).await;
        store
            .put(SHARE_VOLUME, "notify/a@b.1.pad", Bytes::from("{}"))
            .await
            .unwrap();
        store
            .put(SHARE_VOLUME, "zzz/broken", Bytes::from("not json"))
            .await
            .unwrap();

        let report = SweepJob::new(store.clone(), SHARE_VOLUME.to_string())
            .run()
            .await
            .unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.deleted, 0);
        // An unreadable record is logged and left in place, not a failure.
        assert_eq!(report.failed, 0);
        assert!(!report.is_failure());
        assert!(store.exists(SHARE_VOLUME, "zzz/broken").await.unwrap());
        assert!(store.exists(SHARE_VOLUME, "notify/a@b.1.pad").await.unwrap());
    }
}
