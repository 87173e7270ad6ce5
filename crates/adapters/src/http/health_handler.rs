use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use utoipa::ToSchema;

use super::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    pub status: &'static str,
    /// Whether the lazy polling bootstrap has happened yet. The process is
    /// ready either way; polling starts with the first credentialed request.
    pub polling_initialized: bool,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Process is up", body = HealthResponse)),
    tag = "health"
)]
pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Readiness probe.
#[utoipa::path(
    get,
    path = "/readyz",
    responses((status = 200, description = "Process is serving", body = ReadyResponse)),
    tag = "health"
)]
pub async fn readyz(State(state): State<Arc<AppState>>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        status: "ready",
        polling_initialized: state.polling.is_initialized(),
    })
}
