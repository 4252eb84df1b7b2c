//! HTTP API request handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, warn};

use super::types::*;
use crate::pipeline::{AskError, AskPipeline};
use crate::retrieval::SearchError;
use crate::types::Category;
use crate::vector::VectorBackend;

/// Interval for SSE keep-alive pings
const SSE_KEEP_ALIVE_SECS: u64 = 15;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AskPipeline>,
    pub vectors: Arc<dyn VectorBackend>,
}

/// Parse an optional category filter, returning an error response when the
/// value names no known category. Blank strings count as "no filter".
fn parse_category(raw: Option<&str>) -> Result<Option<Category>, Response> {
    let Some(raw) = raw else { return Ok(None) };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match Category::parse(trimmed) {
        Some(category) => Ok(Some(category)),
        None => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "INVALID_CATEGORY",
                format!(
                    "Unknown category '{}': expected 'main', 'news', or 'people'",
                    trimmed
                ),
            )),
        )
            .into_response()),
    }
}

/// Stable error code for a request validation failure
fn search_error_code(err: &SearchError) -> &'static str {
    match err {
        SearchError::EmptyQuery => "EMPTY_QUESTION",
        SearchError::QueryTooLong { .. } => "QUESTION_TOO_LONG",
        SearchError::InvalidTopK { .. } => "INVALID_TOP_K",
        SearchError::InvalidAlpha { .. } => "INVALID_ALPHA",
    }
}

/// Ask endpoint: search, build context, answer
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> impl IntoResponse {
    let category = match parse_category(request.category.as_deref()) {
        Ok(category) => category,
        Err(resp) => return resp,
    };

    debug!(
        "HTTP ask request: top_k={}, category={:?}",
        request.top_k, category
    );

    match state
        .pipeline
        .ask(&request.question, request.top_k, category)
        .await
    {
        Ok(response) => {
            let sources: Vec<SourceDocumentJson> =
                response.sources.iter().map(SourceDocumentJson::from).collect();
            (
                StatusCode::OK,
                Json(AskResponse {
                    answer: response.answer,
                    query: response.query,
                    sources,
                }),
            )
                .into_response()
        }
        Err(AskError::Search(err)) => {
            debug!("ask request rejected: {}", err);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(search_error_code(&err), err.to_string())),
            )
                .into_response()
        }
        Err(AskError::Llm(err)) => {
            error!("answer generation failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "LLM_ERROR",
                    format!("Answer generation failed: {}", err),
                )),
            )
                .into_response()
        }
    }
}

/// Streaming ask endpoint.
///
/// Emits the sources as the first SSE event so clients can render them
/// while tokens arrive, then one `token` event per fragment, and finally
/// `done`. A failure mid-generation becomes a terminal `error` event.
/// Validation failures are rejected as plain JSON before any stream opens.
pub async fn ask_stream(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> impl IntoResponse {
    let category = match parse_category(request.category.as_deref()) {
        Ok(category) => category,
        Err(resp) => return resp,
    };

    debug!(
        "HTTP ask/stream request: top_k={}, category={:?}",
        request.top_k, category
    );

    let (sources, mut tokens) = match state
        .pipeline
        .ask_stream(&request.question, request.top_k, category)
        .await
    {
        Ok(started) => started,
        Err(AskError::Search(err)) => {
            debug!("ask/stream request rejected: {}", err);
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(search_error_code(&err), err.to_string())),
            )
                .into_response();
        }
        Err(AskError::Llm(err)) => {
            error!("failed to start streaming answer: {}", err);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "LLM_ERROR",
                    format!("Answer generation failed: {}", err),
                )),
            )
                .into_response();
        }
    };

    let sources_json: Vec<SourceDocumentJson> =
        sources.iter().map(SourceDocumentJson::from).collect();
    let sources_event = match serde_json::to_string(&sources_json) {
        Ok(json) => Event::default().event("sources").data(json),
        Err(e) => {
            error!("failed to serialize sources: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error("Failed to serialize sources")),
            )
                .into_response();
        }
    };

    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(32);

    tokio::spawn(async move {
        if tx.send(Ok(sources_event)).await.is_err() {
            return;
        }

        while let Some(item) = tokens.next().await {
            match item {
                Ok(token) => {
                    // Newlines are escaped so a token stays a single data line
                    let event = Event::default()
                        .event("token")
                        .data(token.replace('\n', "\\n"));
                    if tx.send(Ok(event)).await.is_err() {
                        debug!("SSE client disconnected mid-answer");
                        return;
                    }
                }
                Err(e) => {
                    warn!("streaming answer failed: {}", e);
                    let payload = serde_json::json!({ "error": e.to_string() });
                    let _ = tx
                        .send(Ok(Event::default().event("error").data(payload.to_string())))
                        .await;
                    return;
                }
            }
        }

        let _ = tx
            .send(Ok(Event::default().event("done").data("[DONE]")))
            .await;
    });

    Sse::new(ReceiverStream::new(rx))
        .keep_alive(KeepAlive::default().interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS)))
        .into_response()
}

/// Health check endpoint: probes the vector backend
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let qdrant_connected = state.vectors.is_healthy().await;
    let status = if qdrant_connected { "ok" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        model: state.pipeline.model().to_string(),
        qdrant_connected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Category parsing
    // ========================================================================

    #[test]
    fn parse_category_passes_known_values() {
        assert_eq!(parse_category(Some("news")).unwrap(), Some(Category::News));
        assert_eq!(parse_category(Some("people")).unwrap(), Some(Category::People));
        assert_eq!(parse_category(Some("main")).unwrap(), Some(Category::Main));
    }

    #[test]
    fn parse_category_treats_blank_as_no_filter() {
        assert_eq!(parse_category(None).unwrap(), None);
        assert_eq!(parse_category(Some("")).unwrap(), None);
        assert_eq!(parse_category(Some("   ")).unwrap(), None);
    }

    #[test]
    fn parse_category_trims_before_matching() {
        assert_eq!(parse_category(Some(" news ")).unwrap(), Some(Category::News));
    }

    #[test]
    fn parse_category_rejects_unknown_values() {
        assert!(parse_category(Some("sports")).is_err());
        assert!(parse_category(Some("string")).is_err());
    }

    // ========================================================================
    // Error code mapping
    // ========================================================================

    #[test]
    fn search_errors_map_to_stable_codes() {
        assert_eq!(search_error_code(&SearchError::EmptyQuery), "EMPTY_QUESTION");
        assert_eq!(
            search_error_code(&SearchError::QueryTooLong { max: 1000 }),
            "QUESTION_TOO_LONG"
        );
        assert_eq!(
            search_error_code(&SearchError::InvalidTopK { got: 0, max: 20 }),
            "INVALID_TOP_K"
        );
        assert_eq!(
            search_error_code(&SearchError::InvalidAlpha { got: 2.0 }),
            "INVALID_ALPHA"
        );
    }
}
