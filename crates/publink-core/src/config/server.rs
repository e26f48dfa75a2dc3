//! HTTP server configuration.

use serde::{Deserialize, Serialize};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL prepended to generated publinks,
    /// e.g. `https://share.example.com`. No trailing slash.
    #[serde(default = "default_base_url")]
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: default_base_url(),
        }
    }
}

impl ServerConfig {
    /// Build the publink URL for a share token.
    pub fn publink(&self, token: &str) -> String {
        format!(
            "{}/s/{}",
            self.public_base_url.trim_end_matches('/'),
            token.trim_start_matches('/')
        )
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}
