//! Session-cache pruning job.

use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use publink_auth::SessionAuthCache;

/// Evicts idle entries from the session auth cache.
#[derive(Debug, Clone)]
pub struct SessionPruneJob {
    sessions: Arc<SessionAuthCache>,
    max_idle: Duration,
}

impl SessionPruneJob {
    pub fn new(sessions: Arc<SessionAuthCache>, idle_seconds: u64) -> Self {
        Self {
            sessions,
            max_idle: Duration::seconds(idle_seconds as i64),
        }
    }

    /// Returns the number of sessions removed.
    pub fn run(&self) -> usize {
        let removed = self.sessions.prune(self.max_idle);
        info!(removed, remaining = self.sessions.len(), "Session prune finished");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_leaves_fresh_sessions() {
        let cache = Arc::new(SessionAuthCache::new());
        let session = cache.new_session();
        cache.mark_verified(session, "t/f.txt");

        let job = SessionPruneJob::new(cache.clone(), 3600);
        assert_eq!(job.run(), 0);
        assert!(cache.is_verified(session, "t/f.txt"));
    }
}
