//! Share metadata record and storage-path helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use publink_core::error::AppError;
use publink_core::result::AppResult;

/// Metadata describing one shared file or directory.
///
/// Serialized as JSON and stored in the share-links volume under the
/// token key. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    /// Display name of the shared target (last path component).
    pub filename: String,
    /// Full storage path, `/<volume>/<key...>`. A trailing slash marks
    /// a directory share.
    pub path: String,
    /// Expiry as unix seconds. `None` never expires.
    #[serde(default)]
    pub expires_on: Option<i64>,
    /// Argon2id hash of the share password, if protected.
    #[serde(default)]
    pub password: Option<String>,
    /// Email address to notify about downloads, if any.
    #[serde(default)]
    pub notify: Option<String>,
}

impl ShareRecord {
    /// Whether this share points at a directory.
    pub fn is_dir(&self) -> bool {
        self.path.ends_with('/')
    }

    /// Whether the share has passed its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_on {
            Some(ts) => ts < now.timestamp(),
            None => false,
        }
    }

    /// Whether the share requires a password.
    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|h| !h.is_empty())
    }
}

/// Split a storage path `/<volume>/<key...>` into volume and key.
///
/// The key keeps any trailing slash so directory paths survive the
/// round trip. An empty key is valid and means the volume root.
pub fn split_volume_path(path: &str) -> AppResult<(String, String)> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (volume, key) = match trimmed.split_once('/') {
        Some((v, k)) => (v, k),
        None => (trimmed, ""),
    };
    if volume.is_empty() {
        return Err(AppError::validation(format!("Invalid storage path: {path}")));
    }
    Ok((volume.to_string(), key.to_string()))
}

/// Last component of a storage path, ignoring any trailing slash.
pub fn filename_of(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expires_on: Option<i64>) -> ShareRecord {
        ShareRecord {
            filename: "report.pdf".to_string(),
            path: "/vol/dir/report.pdf".to_string(),
            expires_on,
            password: None,
            notify: None,
        }
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        assert!(!record(None).is_expired(now));
        assert!(!record(Some(now.timestamp() + 60)).is_expired(now));
        assert!(record(Some(now.timestamp() - 1)).is_expired(now));
    }

    #[test]
    fn test_dir_detection() {
        let mut r = record(None);
        assert!(!r.is_dir());
        r.path = "/vol/dir/".to_string();
        assert!(r.is_dir());
    }

    #[test]
    fn test_split_volume_path() {
        assert_eq!(
            split_volume_path("/vol/dir/file.txt").unwrap(),
            ("vol".to_string(), "dir/file.txt".to_string())
        );
        assert_eq!(
            split_volume_path("/vol/dir/").unwrap(),
            ("vol".to_string(), "dir/".to_string())
        );
        assert_eq!(
            split_volume_path("/vol").unwrap(),
            ("vol".to_string(), String::new())
        );
        assert!(split_volume_path("/").is_err());
    }

    #[test]
    fn test_filename_of() {
        assert_eq!(filename_of("/vol/dir/report.pdf"), "report.pdf");
        assert_eq!(filename_of("/vol/dir/"), "dir");
        assert_eq!(filename_of("/vol"), "vol");
    }

    #[test]
    fn test_record_tolerates_missing_optional_fields() {
        let r: ShareRecord =
            serde_json::from_str(r#"{"filename":"a.txt","path":"/vol/a.txt"}"#).unwrap();
        assert_eq!(r.expires_on, None);
        assert!(!r.has_password());
        assert_eq!(r.notify, None);
    }
}
