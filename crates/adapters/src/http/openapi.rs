use utoipa::OpenApi;

use super::dispatch_handler;
use super::health_handler;
use super::metrics_handler;
use super::status_handler;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "alertrelay API",
        description = "Inbound action protocol and operational endpoints of the alert-ingestion core"
    ),
    paths(
        dispatch_handler::dispatch_action,
        health_handler::healthz,
        health_handler::readyz,
        status_handler::integration_status,
        metrics_handler::metrics,
    ),
    components(schemas(
        health_handler::HealthResponse,
        health_handler::ReadyResponse,
        status_handler::PollingStatus,
        status_handler::IntegrationStatusResponse,
    ))
)]
pub struct ApiDoc;
