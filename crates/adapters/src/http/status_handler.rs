use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use utoipa::ToSchema;

use super::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct PollingStatus {
    pub initialized: bool,
    /// Completion time of the last alerts cycle (epoch ms).
    pub last_poll_time: Option<i64>,
    /// Whether a resumption cursor is stored. The cursor itself is an
    /// opaque vendor token and is not exposed.
    pub has_cursor: bool,
    pub alert_count: u64,
    pub total_alerts_processed: u64,
    pub last_since: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct IntegrationStatusResponse {
    pub version: String,
    pub uptime_seconds: u64,
    pub polling: PollingStatus,
    pub cached_alerts: usize,
    pub lists_cached: usize,
}

/// Operational snapshot: polling state, cache occupancy, lists catalog.
#[utoipa::path(
    get,
    path = "/api/v1/status",
    responses((status = 200, description = "Integration status", body = IntegrationStatusResponse)),
    tag = "status"
)]
pub async fn integration_status(
    State(state): State<Arc<AppState>>,
) -> Json<IntegrationStatusResponse> {
    let snapshot = state.polling.state_snapshot();
    Json(IntegrationStatusResponse {
        version: state.version.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        polling: PollingStatus {
            initialized: state.polling.is_initialized(),
            last_poll_time: snapshot.last_poll_time,
            has_cursor: snapshot.last_cursor.is_some(),
            alert_count: snapshot.alert_count,
            total_alerts_processed: snapshot.total_alerts_processed,
            last_since: snapshot.last_since,
        },
        cached_alerts: state.cache.len(),
        lists_cached: state.cache.lists().len(),
    })
}
