//! HTTP service configuration

use serde::{Deserialize, Serialize};

/// HTTP service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for the HTTP API (e.g., "127.0.0.1:8000")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Enable CORS (useful for browser-based clients)
    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_cors_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            cors_enabled: default_cors_enabled(),
        }
    }
}
