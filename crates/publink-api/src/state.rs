//! Application state shared across all handlers.

use std::sync::Arc;

use publink_auth::SessionAuthCache;
use publink_core::config::AppConfig;
use publink_core::traits::store::ObjectStore;
use publink_service::{AccessService, ShareService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Object-store client.
    pub store: Arc<dyn ObjectStore>,
    /// Share creation service.
    pub share_service: Arc<ShareService>,
    /// Anonymous access gate.
    pub access_service: Arc<AccessService>,
    /// Per-browser-session password verification cache.
    pub sessions: Arc<SessionAuthCache>,
}
