//! Qdrant REST client.
//!
//! Talks to the points API directly: collection management, batched
//! upserts, and filtered nearest-neighbor search.

use super::{VectorBackend, VectorStoreError, VectorStoreResult};
use crate::config::VectorConfig;
use crate::types::{Category, Embedding, Passage, SemanticHit};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Points per upsert request
const UPSERT_BATCH: usize = 100;

/// Qdrant vector backend over its REST API
#[derive(Debug)]
pub struct QdrantBackend {
    client: Client,
    base: String,
    collection: String,
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
}

#[derive(Debug, Serialize)]
struct Filter {
    must: Vec<FieldCondition>,
}

#[derive(Debug, Serialize)]
struct FieldCondition {
    key: &'static str,
    #[serde(rename = "match")]
    match_value: MatchValue,
}

#[derive(Debug, Serialize)]
struct MatchValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<PassagePayload>,
}

#[derive(Debug, Default, Deserialize)]
struct PassagePayload {
    #[serde(default)]
    source_url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    category: String,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    points: Vec<PointStruct<'a>>,
}

#[derive(Debug, Serialize)]
struct PointStruct<'a> {
    id: usize,
    vector: &'a [f32],
    payload: PointPayload<'a>,
}

#[derive(Debug, Serialize)]
struct PointPayload<'a> {
    chunk_id: &'a str,
    text: &'a str,
    source_url: &'a str,
    title: &'a str,
    category: &'static str,
    chunk_index: usize,
    total_chunks: usize,
}

// ============================================================================
// Client
// ============================================================================

impl QdrantBackend {
    /// Create a client from its config section. The URL is validated here
    /// so a typo fails at startup, not on the first query.
    pub fn new(config: &VectorConfig) -> VectorStoreResult<Self> {
        let parsed = Url::parse(&config.url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!(
            "Qdrant backend: {} collection '{}'",
            parsed, config.collection
        );

        Ok(Self {
            client,
            base: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base, self.collection)
    }

    async fn error_body(response: reqwest::Response) -> String {
        response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string())
    }
}

fn hits_from_response(response: SearchResponse) -> Vec<SemanticHit> {
    response
        .result
        .into_iter()
        .filter_map(|point| {
            let payload = point.payload?;
            Some(SemanticHit {
                url: payload.source_url,
                title: payload.title,
                category: Category::parse(&payload.category).unwrap_or(Category::Main),
                similarity: point.score,
            })
        })
        .collect()
}

#[async_trait::async_trait]
impl VectorBackend for QdrantBackend {
    async fn query(
        &self,
        vector: &[f32],
        limit: usize,
        category: Option<Category>,
    ) -> VectorStoreResult<Vec<SemanticHit>> {
        let filter = category.map(|cat| Filter {
            must: vec![FieldCondition {
                key: "category",
                match_value: MatchValue {
                    value: cat.as_str().to_string(),
                },
            }],
        });

        let request = SearchRequest {
            vector,
            limit,
            with_payload: true,
            filter,
        };

        let response = self
            .client
            .post(format!("{}/points/search", self.collection_url()))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = Self::error_body(response).await;
            return Err(VectorStoreError::Backend(format!(
                "search failed ({}): {}",
                status, body
            )));
        }

        let parsed: SearchResponse = response.json().await?;
        let hits = hits_from_response(parsed);
        debug!("semantic search: {} passages", hits.len());
        Ok(hits)
    }

    async fn recreate_collection(&self, dimensions: usize) -> VectorStoreResult<()> {
        // Delete first; a 404 just means there was nothing to delete
        let delete = self.client.delete(self.collection_url()).send().await;
        if let Err(e) = delete {
            warn!("collection delete failed, continuing: {}", e);
        }

        let request = CreateCollectionRequest {
            vectors: VectorParams {
                size: dimensions,
                distance: "Cosine",
            },
        };

        let response = self
            .client
            .put(self.collection_url())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = Self::error_body(response).await;
            return Err(VectorStoreError::Backend(format!(
                "collection create failed ({}): {}",
                status, body
            )));
        }

        info!(
            "collection '{}' created (dim={}, metric=Cosine)",
            self.collection, dimensions
        );
        Ok(())
    }

    async fn upsert(&self, passages: &[Passage], vectors: &[Embedding]) -> VectorStoreResult<()> {
        if passages.len() != vectors.len() {
            return Err(VectorStoreError::Backend(format!(
                "passage/vector count mismatch: {} vs {}",
                passages.len(),
                vectors.len()
            )));
        }

        let total = passages.len();
        let mut uploaded = 0usize;

        for batch_start in (0..total).step_by(UPSERT_BATCH) {
            let batch_end = (batch_start + UPSERT_BATCH).min(total);
            let points: Vec<PointStruct<'_>> = (batch_start..batch_end)
                .map(|i| {
                    let passage = &passages[i];
                    PointStruct {
                        id: i,
                        vector: &vectors[i],
                        payload: PointPayload {
                            chunk_id: &passage.chunk_id,
                            text: &passage.text,
                            source_url: &passage.url,
                            title: &passage.title,
                            category: passage.category.as_str(),
                            chunk_index: passage.chunk_index,
                            total_chunks: passage.total_chunks,
                        },
                    }
                })
                .collect();

            let response = self
                .client
                .put(format!("{}/points?wait=true", self.collection_url()))
                .json(&UpsertRequest { points })
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = Self::error_body(response).await;
                return Err(VectorStoreError::Backend(format!(
                    "upsert failed ({}): {}",
                    status, body
                )));
            }

            uploaded = batch_end;
            debug!("upserted {}/{} points", uploaded, total);
        }

        info!("upserted {} passages into '{}'", uploaded, self.collection);
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        match self
            .client
            .get(format!("{}/collections", self.base))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
