use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use super::error::ApiError;
use super::state::AppState;

/// Dispatch one action payload against the ingestion core.
///
/// The payload carries a required `action` discriminator
/// (`lookup`, `getAlerts`, `getAlertById`, `renderAlertDetail`,
/// `renderAlertNotification`); remaining fields depend on the action.
#[utoipa::path(
    post,
    path = "/api/v1/dispatch",
    responses(
        (status = 200, description = "Action-specific response record"),
        (status = 400, description = "Missing/unknown action or invalid fields"),
        (status = 502, description = "Vendor upstream failure"),
        (status = 503, description = "Gateway queue full or timed out"),
    ),
    tag = "dispatch"
)]
pub async fn dispatch_action(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Response {
    match state.dispatcher.dispatch(&payload).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
