//! Vector backend configuration

use serde::{Deserialize, Serialize};

/// Qdrant backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Base URL of the Qdrant REST API
    #[serde(default = "default_url")]
    pub url: String,
    /// Collection holding the passage embeddings
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "department_chunks".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            collection: default_collection(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
