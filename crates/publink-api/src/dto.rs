//! Request and response bodies for the HTTP surface.

use serde::{Deserialize, Serialize};
use validator::Validate;

use publink_core::types::pagination::PageResponse;
use publink_service::share::access::ListingEntry;

/// Body of `POST /api/shares`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateShareRequest {
    /// Storage path to share, `/<volume>/<path...>`.
    #[validate(length(min = 2, message = "path is required"))]
    pub path: String,
    /// Access key authorizing share creation.
    #[serde(default)]
    pub access_key: String,
    /// Seconds until expiry, relative to now.
    #[serde(default)]
    pub expire_time: Option<i64>,
    /// Optional share password.
    #[serde(default)]
    pub password: Option<String>,
    /// Optional email to notify about downloads.
    #[serde(default)]
    #[validate(email(message = "notify must be a valid email address"))]
    pub notify: Option<String>,
}

/// Body of the share-creation response, matching the shape share
/// tooling scripts expect: `status` plus either `publink` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShareResponse {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publink: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CreateShareResponse {
    pub fn ok(publink: String) -> Self {
        Self {
            status: true,
            publink: Some(publink),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            status: false,
            publink: None,
            error: Some(error.into()),
        }
    }
}

/// Body of `POST /s/...` password verification.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPasswordRequest {
    pub password: String,
}

/// Directory-listing page for a directory share.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryListing {
    /// Name of the listed directory.
    pub name: String,
    #[serde(flatten)]
    pub page: PageResponse<ListingEntry>,
}

/// Query parameters accepted on share-access GETs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessQuery {
    /// Listing page number (1-based).
    #[serde(default)]
    pub page: Option<u64>,
}
