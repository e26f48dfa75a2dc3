//! In-process cache of sessions that have cleared a share password.
//!
//! A session that presents the correct password for a protected link is
//! remembered here so subsequent requests within the same session skip
//! the password form. Entries are evicted by the periodic prune job once
//! they have been idle longer than the configured threshold.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug)]
struct SessionEntry {
    verified_tokens: HashSet<String>,
    last_seen: DateTime<Utc>,
}

/// Concurrent map of session id to the set of link tokens the session
/// has already unlocked.
#[derive(Debug, Default)]
pub struct SessionAuthCache {
    sessions: DashMap<Uuid, SessionEntry>,
}

impl SessionAuthCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh session id.
    pub fn new_session(&self) -> Uuid {
        Uuid::new_v4()
    }

    /// Whether `session` has already presented the correct password for
    /// `token`. Touches the entry's idle clock on a hit.
    pub fn is_verified(&self, session: Uuid, token: &str) -> bool {
        match self.sessions.get_mut(&session) {
            Some(mut entry) => {
                if entry.verified_tokens.contains(token) {
                    entry.last_seen = Utc::now();
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Record that `session` unlocked `token`.
    pub fn mark_verified(&self, session: Uuid, token: &str) {
        let mut entry = self.sessions.entry(session).or_insert_with(|| SessionEntry {
            verified_tokens: HashSet::new(),
            last_seen: Utc::now(),
        });
        entry.verified_tokens.insert(token.to_string());
        entry.last_seen = Utc::now();
    }

    /// Drop sessions idle longer than `max_idle`. Returns the number of
    /// sessions removed.
    pub fn prune(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.last_seen >= cutoff);
        let removed = before - self.sessions.len();
        if removed > 0 {
            debug!(removed, "Pruned idle sessions");
        }
        removed
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
