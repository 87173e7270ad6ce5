use std::future::Future;
use std::sync::Arc;

use super::router::build_router;
use super::state::AppState;

/// Run the inbound API server on the given bind address and port.
///
/// Shuts down gracefully when `shutdown` resolves, draining in-flight
/// connections before returning.
pub async fn run_http_server(
    state: Arc<AppState>,
    bind_address: &str,
    port: u16,
    swagger_ui: bool,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let router = build_router(state, swagger_ui);
    let listener = tokio::net::TcpListener::bind(format!("{bind_address}:{port}")).await?;
    tracing::info!(%bind_address, port, swagger_ui, "API server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
