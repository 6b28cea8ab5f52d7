//! Routes are nested under `/api/`.
//!
//! Path params use `:param` syntax (axum 0.7).

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use super::{health, process, upload, AppState};

/// Slack on top of the largest upload for multipart framing.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn api_router(state: AppState) -> Router {
    let body_limit = state
        .limits
        .max_zip_bytes
        .max(state.limits.max_file_bytes)
        .saturating_add(MULTIPART_OVERHEAD);

    let api = Router::new()
        .route("/health", get(health::check))
        .route("/upload/single", post(upload::single))
        .route("/upload/zip", post(upload::zip))
        .route("/upload/status/:batch_id", get(upload::status))
        .route("/process/document", post(process::document))
        .route("/process/batch", post(process::batch))
        .route("/process/status/:process_id", get(process::status))
        .route("/process/result/:process_id", get(process::result))
        .route("/process/retry/:process_id", post(process::retry))
        .route("/process/cancel/:process_id", post(process::cancel))
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
}
