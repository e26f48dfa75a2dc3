//! Notification digest job.
//!
//! Walks download markers written since the last run, groups them by
//! recipient and link, and mails one plain-text digest per recipient.
//! The high-water mark lives in the share volume's custom metadata so
//! every process (server scheduler or standalone CLI) sees the same
//! window. Send failures are logged and skipped; the watermark still
//! advances for the whole batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{info, warn};

use publink_core::config::mail::MailConfig;
use publink_core::config::server::ServerConfig;
use publink_core::result::AppResult;
use publink_core::traits::mailer::{Mailer, OutgoingMail};
use publink_core::traits::store::ObjectStore;
use publink_service::share::marker::{DownloadMarker, MARKER_PREFIX, parse_marker_key};

/// Volume-metadata key holding the last processed unix timestamp.
pub const WATERMARK_KEY: &str = "last_notification_ts";

/// Outcome of one digest run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DigestReport {
    /// Download events inside the window.
    pub events: usize,
    /// Distinct recipients.
    pub recipients: usize,
    /// Digests delivered.
    pub sent: usize,
    /// Digests that failed to send.
    pub failed_sends: usize,
    /// Watermark after the run, unix seconds.
    pub watermark: i64,
}

#[derive(Debug)]
struct Event {
    date: DateTime<Utc>,
    ip: String,
    user_agent: String,
}

/// Builds and sends download digests.
#[derive(Clone)]
pub struct DigestJob {
    store: Arc<dyn ObjectStore>,
    mailer: Arc<dyn Mailer>,
    mail: MailConfig,
    server: ServerConfig,
    share_volume: String,
}

impl DigestJob {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        mailer: Arc<dyn Mailer>,
        mail: MailConfig,
        server: ServerConfig,
        share_volume: String,
    ) -> Self {
        Self {
            store,
            mailer,
            mail,
            server,
            share_volume,
        }
    }

    pub async fn run(&self) -> AppResult<DigestReport> {
        self.run_until(Utc::now()).await
    }

    /// Process markers with timestamps in `(watermark, until]`.
    pub async fn run_until(&self, until: DateTime<Utc>) -> AppResult<DigestReport> {
        let mut meta = self.store.get_volume_meta(&self.share_volume).await?;
        let since: i64 = meta
            .get(WATERMARK_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let mut report = DigestReport {
            watermark: until.timestamp(),
            ..Default::default()
        };

        // recipient -> link -> events
        let mut grouped: BTreeMap<String, BTreeMap<String, Vec<Event>>> = BTreeMap::new();

        let markers = self.store.list_all(&self.share_volume, MARKER_PREFIX).await?;
        for object in markers {
            let Some((email, ts)) = parse_marker_key(&object.key) else {
                warn!(key = %object.key, "Skipping malformed marker key");
                continue;
            };
            if ts <= since || ts > until.timestamp() {
                continue;
            }

            let marker: DownloadMarker = match self
                .store
                .get(&self.share_volume, &object.key)
                .await
                .and_then(|raw| Ok(serde_json::from_slice(&raw)?))
            {
                Ok(marker) => marker,
                Err(e) => {
                    warn!(key = %object.key, error = %e, "Skipping unreadable marker");
                    continue;
                }
            };

            let date = Utc
                .timestamp_opt(ts, 0)
                .single()
                .unwrap_or_else(Utc::now);
            // Directory-share downloads carry the file below the root.
            let mut link = self.server.publink(&marker.token);
            if !marker.subpath.is_empty() {
                link.push('/');
                link.push_str(&marker.subpath);
            }
            grouped
                .entry(email)
                .or_default()
                .entry(link)
                .or_default()
                .push(Event {
                    date,
                    ip: marker.ip,
                    user_agent: marker.user_agent,
                });
            report.events += 1;
        }

        report.recipients = grouped.len();

        let head = self.read_template(self.mail.head_file.as_deref()).await;
        let tail = self.read_template(self.mail.tail_file.as_deref()).await;

        for (recipient, links) in grouped {
            let body = render_digest(&head, &tail, &links);
            let mail = OutgoingMail {
                to: recipient.clone(),
                subject: self.mail.subject.clone(),
                body,
            };
            match self.mailer.send(&mail).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    warn!(recipient = %recipient, error = %e, "Failed to send digest");
                    report.failed_sends += 1;
                }
            }
        }

        // Advance even when sends failed; events are never re-delivered.
        meta.insert(WATERMARK_KEY.to_string(), report.watermark.to_string());
        self.store.set_volume_meta(&self.share_volume, meta).await?;

        info!(
            events = report.events,
            recipients = report.recipients,
            sent = report.sent,
            failed_sends = report.failed_sends,
            watermark = report.watermark,
            "Notification digest finished"
        );
        Ok(report)
    }

    async fn read_template(&self, path: Option<&str>) -> String {
        let Some(path) = path else {
            return String::new();
        };
        match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(path, error = %e, "Failed to read digest template");
                String::new()
            }
        }
    }
}

fn render_digest(head: &str, tail: &str, links: &BTreeMap<String, Vec<Event>>) -> String {
    let mut body = String::new();
    if !head.is_empty() {
        body.push_str(head);
        body.push('\n');
    }
    for (link, events) in links {
        let mut events: Vec<&Event> = events.iter().collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.ip.cmp(&b.ip)));

        body.push_str(link);
        body.push_str(":\n");
        for event in events {
            body.push_str(&format!(
                "  {} {} {}\n",
                event.date.format("%Y-%m-%d %H:%M:%S UTC"),
                event.ip,
                event.user_agent
            ));
        }
        body.push('\n');
    }
    if !tail.is_empty() {
        body.push_str(tail);
        body.push('\n');
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use publink_mail::memory::MemoryMailer;
    use publink_storage::providers::memory::MemoryObjectStore;

    const SHARE_VOLUME: &str = "__sharelinks__";

    async fn put_marker(
        store: &MemoryObjectStore,
        email: &str,
        ts: i64,
        pad: &str,
        token: &str,
        ip: &str,
    ) {
        let marker = DownloadMarker {
            token: token.to_string(),
            path: format!("/vol/{token}"),
            subpath: String::new(),
            ip: ip.to_string(),
            user_agent: "curl/8".to_string(),
        };
        store
            .put(
                SHARE_VOLUME,
                &format!("notify/{email}.{ts}.{pad}"),
                Bytes::from(serde_json::to_vec(&marker).unwrap()),
            )
            .await
            .unwrap();
    }

    fn job(store: Arc<MemoryObjectStore>, mailer: Arc<MemoryMailer>) -> DigestJob {
        DigestJob::new(
            store,
            mailer,
            MailConfig::default(),
            ServerConfig::default(),
            SHARE_VOLUME.to_string(),
        )
    }

    #[tokio::test]
    async fn test_digest_groups_and_sorts() {
        let store = Arc::new(MemoryObjectStore::new());
        store.ensure_volume(SHARE_VOLUME).await.unwrap();
        let mailer = Arc::new(MemoryMailer::new());

        // Two recipients; one link has out-of-order events.
        put_marker(&store, "a@example.com", 200, "p1", "t1/f.txt", "10.0.0.2").await;
        put_marker(&store, "a@example.com", 100, "p2", "t1/f.txt", "10.0.0.1").await;
        put_marker(&store, "a@example.com", 150, "p3", "t2/g.txt", "10.0.0.3").await;
        put_marker(&store, "b@example.com", 120, "p4", "t1/f.txt", "10.0.0.4").await;

        let until = Utc.timestamp_opt(1000, 0).unwrap();
        let report = job(store.clone(), mailer.clone())
            .run_until(until)
            .await
            .unwrap();

        assert_eq!(report.events, 4);
        assert_eq!(report.recipients, 2);
        assert_eq!(report.sent, 2);
        assert_eq!(report.failed_sends, 0);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        let to_a = sent.iter().find(|m| m.to == "a@example.com").unwrap();
        // Events for the same link appear in (date, ip) order.
        let pos_1 = to_a.body.find("10.0.0.1").unwrap();
        let pos_2 = to_a.body.find("10.0.0.2").unwrap();
        assert!(pos_1 < pos_2);
        // Both links appear in the first recipient's digest.
        assert!(to_a.body.contains("/s/t1/f.txt"));
        assert!(to_a.body.contains("/s/t2/g.txt"));

        let to_b = sent.iter().find(|m| m.to == "b@example.com").unwrap();
        assert!(to_b.body.contains("10.0.0.4"));
        assert!(!to_b.body.contains("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_digest_link_includes_the_downloaded_file() {
        let store = Arc::new(MemoryObjectStore::new());
        store.ensure_volume(SHARE_VOLUME).await.unwrap();
        let mailer = Arc::new(MemoryMailer::new());

        let marker = DownloadMarker {
            token: "t1/docs".to_string(),
            path: "/vol/docs/img/logo.png".to_string(),
            subpath: "img/logo.png".to_string(),
            ip: "10.0.0.1".to_string(),
            user_agent: "curl/8".to_string(),
        };
        store
            .put(
                SHARE_VOLUME,
                "notify/a@example.com.100.pad",
                Bytes::from(serde_json::to_vec(&marker).unwrap()),
            )
            .await
            .unwrap();

        let until = Utc.timestamp_opt(1000, 0).unwrap();
        job(store.clone(), mailer.clone())
            .run_until(until)
            .await
            .unwrap();

        assert!(mailer.sent()[0].body.contains("/s/t1/docs/img/logo.png"));
    }

    #[tokio::test]
    async fn test_window_respects_watermark() {
        let store = Arc::new(MemoryObjectStore::new());
        store.ensure_volume(SHARE_VOLUME).await.unwrap();
        let mailer = Arc::new(MemoryMailer::new());

        put_marker(&store, "a@example.com", 100, "p1", "t1/f.txt", "10.0.0.1").await;
        put_marker(&store, "a@example.com", 300, "p2", "t1/f.txt", "10.0.0.2").await;

        let mut meta = std::collections::HashMap::new();
        meta.insert(WATERMARK_KEY.to_string(), "100".to_string());
        store.set_volume_meta(SHARE_VOLUME, meta).await.unwrap();

        // The event at the watermark itself was already delivered.
        let until = Utc.timestamp_opt(1000, 0).unwrap();
        let report = job(store.clone(), mailer.clone())
            .run_until(until)
            .await
            .unwrap();
        assert_eq!(report.events, 1);
        assert!(mailer.sent()[0].body.contains("10.0.0.2"));
    }

    #[tokio::test]
    async fn test_watermark_advances_despite_send_failures() {
        let store = Arc::new(MemoryObjectStore::new());
        store.ensure_volume(SHARE_VOLUME).await.unwrap();
        let mailer = Arc::new(MemoryMailer::new());
        mailer.fail_for("down@example.com");

        put_marker(&store, "down@example.com", 100, "p1", "t1/f.txt", "10.0.0.1").await;
        put_marker(&store, "up@example.com", 110, "p2", "t1/f.txt", "10.0.0.2").await;

        let until = Utc.timestamp_opt(500, 0).unwrap();
        let report = job(store.clone(), mailer.clone())
            .run_until(until)
            .await
            .unwrap();

        assert_eq!(report.sent, 1);
        assert_eq!(report.failed_sends, 1);
        assert_eq!(report.watermark, 500);

        let meta = store.get_volume_meta(SHARE_VOLUME).await.unwrap();
        assert_eq!(meta.get(WATERMARK_KEY).unwrap(), "500");

        // The failed recipient's events are gone for good.
        let rerun = job(store.clone(), mailer.clone())
            .run_until(Utc.timestamp_opt(600, 0).unwrap())
            .await
            .unwrap();
        assert_eq!(rerun.events, 0);
    }
}
