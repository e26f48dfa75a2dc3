//! Share-link lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Share creation and access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Length of the random token component.
    #[serde(default = "default_token_length")]
    pub token_length: usize,
    /// Deadline in seconds for the token-uniqueness loop plus record upload.
    #[serde(default = "default_create_timeout")]
    pub create_timeout_seconds: u64,
    /// Minimum share password length.
    #[serde(default = "default_min_password")]
    pub min_password_length: usize,
    /// Access key required by the share-creation API. Empty disables the
    /// endpoint entirely rather than leaving it open.
    #[serde(default)]
    pub access_key: String,
    /// Directory-listing page size.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            token_length: default_token_length(),
            create_timeout_seconds: default_create_timeout(),
            min_password_length: default_min_password(),
            access_key: String::new(),
            page_size: default_page_size(),
        }
    }
}

fn default_token_length() -> usize {
    12
}

fn default_create_timeout() -> u64 {
    55
}

fn default_min_password() -> usize {
    8
}

fn default_page_size() -> u64 {
    20
}
