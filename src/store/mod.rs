//! Document snapshot store.
//!
//! A URL-keyed map of full page texts, persisted as JSON. The snapshot is
//! loaded once at startup and read-only afterwards; the lexical index is
//! rebuilt from it rather than persisted separately.

mod builder;

pub use builder::build_snapshot;

use crate::types::{Category, Document, MISSING_TEXT_SENTINEL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while loading or writing the snapshot
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// One page as persisted in the snapshot, keyed externally by URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub title: String,
    pub text: String,
    pub category: Category,
}

/// URL-keyed snapshot of full page texts.
///
/// Backed by a `BTreeMap` so iteration order, and with it the internal ids
/// of the lexical index, is stable across runs.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DocumentStore {
    docs: BTreeMap<String, StoredDocument>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut store = Self::new();
        for doc in documents {
            store.insert(doc);
        }
        store
    }

    pub fn insert(&mut self, doc: Document) {
        self.docs.insert(
            doc.url,
            StoredDocument {
                title: doc.title,
                text: doc.text,
                category: doc.category,
            },
        );
    }

    /// Load a snapshot from a JSON file of shape `url → {title, text, category}`.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path)?;
        let docs: BTreeMap<String, StoredDocument> = serde_json::from_str(&json)?;
        debug!("document snapshot loaded: {} pages", docs.len());
        Ok(Self { docs })
    }

    /// Write the snapshot as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.docs)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&StoredDocument> {
        self.docs.get(url)
    }

    /// Full text for a URL. A URL that is ranked but absent from the
    /// snapshot resolves to a placeholder; it must never fail the query.
    pub fn resolve(&self, url: &str) -> String {
        match self.docs.get(url) {
            Some(doc) => doc.text.clone(),
            None => {
                warn!("full text missing for '{}', serving placeholder", url);
                MISSING_TEXT_SENTINEL.to_string()
            }
        }
    }

    /// Iterate pages as full documents, in URL order.
    pub fn documents(&self) -> impl Iterator<Item = Document> + '_ {
        self.docs.iter().map(|(url, doc)| Document {
            url: url.clone(),
            title: doc.title.clone(),
            text: doc.text.clone(),
            category: doc.category,
        })
    }
}
