//! HTTP API server
//!
//! Axum-based REST surface over the ask pipeline: question answering,
//! SSE streaming, and a health probe.

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use server::HttpServer;
