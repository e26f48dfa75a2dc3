//! Download markers.
//!
//! One marker object is written per successful access to a notified
//! share. The digest job later lists markers by timestamp, so the
//! recipient email and unix timestamp are encoded into the key:
//! `notify/<email>.<ts>.<random padding>`. The padding keeps two
//! downloads in the same second from colliding.

use serde::{Deserialize, Serialize};

use super::token::generate_prefix;

/// Prefix under which markers live in the share-links volume.
pub const MARKER_PREFIX: &str = "notify/";

const PADDING_LEN: usize = 6;

/// One recorded download of a notified share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadMarker {
    /// Token of the share that was accessed.
    pub token: String,
    /// Storage path of the downloaded file. For directory shares this is
    /// the file inside the share, not the shared root.
    pub path: String,
    /// Subpath below the shared root, empty for direct file shares. The
    /// digest appends it to the publink so recipients see which file.
    #[serde(default)]
    pub subpath: String,
    /// Client IP as reported by the HTTP layer.
    pub ip: String,
    /// Client user agent.
    pub user_agent: String,
}

/// Build a marker key for `email` at unix time `ts`.
pub fn marker_key(email: &str, ts: i64) -> String {
    format!("{MARKER_PREFIX}{email}.{ts}.{}", generate_prefix(PADDING_LEN))
}

/// Parse a marker key back into `(email, unix ts)`.
///
/// Returns `None` for keys that do not follow the marker layout; the
/// digest job skips those.
pub fn parse_marker_key(key: &str) -> Option<(String, i64)> {
    let rest = key.strip_prefix(MARKER_PREFIX)?;
    let mut parts = rest.rsplitn(3, '.');
    let _padding = parts.next()?;
    let ts: i64 = parts.next()?.parse().ok()?;
    let email = parts.next()?;
    if email.is_empty() {
        return None;
    }
    Some((email.to_string(), ts))
}
