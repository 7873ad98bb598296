//! HTTP routes for the gateway

pub mod jobs;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use crate::server::state::AppState;

/// Submission and status routes
pub fn job_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Upload - with larger body limit for file payloads
        .route(
            "/upload",
            post(jobs::upload).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/status/:job_id", get(jobs::job_status))
}

/// Routes under /api
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "rag-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Accepts documents for asynchronous processing and reports job status",
        "endpoints": {
            "POST /upload": "Upload a file (multipart field 'file') for processing",
            "GET /status/:job_id": "Get the current status of a job",
            "GET /health": "Liveness",
            "GET /ready": "Readiness"
        },
        "statuses": ["Pending", "Processing", "Complete", "Failed"]
    }))
}
