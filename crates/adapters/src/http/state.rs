use std::sync::Arc;
use std::time::Instant;

use application::cache_service::CacheService;
use application::dispatch_service::Dispatcher;
use application::polling_service::PollingEngine;
use infrastructure::metrics::IntegrationMetrics;

/// Shared application state for the inbound API server.
///
/// Passed to Axum handlers via `State(Arc<AppState>)`.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub polling: Arc<PollingEngine>,
    pub cache: Arc<CacheService>,
    pub metrics: Arc<IntegrationMetrics>,
    pub start_time: Instant,
    pub version: &'static str,
}

impl AppState {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        polling: Arc<PollingEngine>,
        cache: Arc<CacheService>,
        metrics: Arc<IntegrationMetrics>,
    ) -> Self {
        Self {
            dispatcher,
            polling,
            cache,
            metrics,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
