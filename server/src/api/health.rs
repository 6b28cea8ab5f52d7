use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// `GET /api/health`
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let counts = state.service.counts();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        processing: counts.processing,
        completed: counts.completed,
        failed: counts.failed,
    })
}
