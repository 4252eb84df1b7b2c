//! Document store configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Document snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Snapshot of full page texts, keyed by URL
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    /// Directory of cleaned page JSON files the snapshot is built from
    #[serde(default = "default_cleaned_dir")]
    pub cleaned_dir: PathBuf,
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data/chunks/doc_texts.json")
}

fn default_cleaned_dir() -> PathBuf {
    PathBuf::from("data/cleaned")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            cleaned_dir: default_cleaned_dir(),
        }
    }
}
