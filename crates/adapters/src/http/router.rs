use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::dispatch_handler::dispatch_action;
use super::health_handler::{healthz, readyz};
use super::metrics_handler::metrics;
use super::openapi::ApiDoc;
use super::state::AppState;
use super::status_handler::integration_status;

/// Maximum request body size for the dispatch endpoint (256 KiB — lookup
/// payloads can carry many indicators).
const MAX_BODY_SIZE: usize = 256 * 1024;

/// Build the inbound API router.
///
/// Routes split into two groups: public probes (`/healthz`, `/readyz`,
/// `/metrics`) and the action API (`/api/v1/*`). Requester authentication
/// is the embedding host's concern, so no auth middleware lives here.
pub fn build_router(state: Arc<AppState>, swagger_ui: bool) -> Router {
    let probe_routes = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics));

    let api_routes = Router::new()
        .route("/api/v1/dispatch", post(dispatch_action))
        .route("/api/v1/status", get(integration_status))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    let mut router = probe_routes.merge(api_routes);
    if swagger_ui {
        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }
    router.with_state(state)
}
