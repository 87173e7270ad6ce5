use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use adapters::http::{AppState, run_http_server};
use adapters::render::html::HtmlRenderer;
use adapters::vendor::bulk::BulkFeedClient;
use adapters::vendor::client::VendorClient;
use application::cache_service::CacheService;
use application::dispatch_service::{DispatchConfig, Dispatcher};
use application::lookup_service::{LookupService, TRIAL_MODE};
use application::polling_service::{PollingConfig, PollingEngine};
use infrastructure::config::{IngestMode, IntegrationConfig};
use infrastructure::constants::{
    DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT, GRACEFUL_SHUTDOWN_TIMEOUT, LISTS_POLL_INTERVAL,
    MAX_PAGES, MAX_PAGE_SIZE, PAGE_PACING_MAX, PAGE_PACING_MIN,
};
use infrastructure::logging::init_logging;
use infrastructure::metrics::IntegrationMetrics;
use ports::secondary::bulk_feed::BulkFeedSource;
use ports::secondary::metrics_port::MetricsPort;
use ports::secondary::vendor_gateway::VendorGateway;

use crate::cli::Cli;

/// Run the agent startup sequence and block until shutdown.
pub async fn run(cli: &Cli) -> anyhow::Result<()> {
    // ── 1. Load config ──────────────────────────────────────────────
    let config = IntegrationConfig::load(Path::new(&cli.config))
        .map_err(|e| anyhow::anyhow!("config '{}': {e}", cli.config))?;

    // ── 2. Initialize logging ───────────────────────────────────────
    // CLI flags take precedence over the config file.
    let log_level = cli.log_level.unwrap_or(config.agent.log_level);
    let log_format = cli.log_format.unwrap_or(config.agent.log_format);
    init_logging(log_level, log_format)?;

    // Service root span: fields appear in every subsequent log entry.
    let _root_span = tracing::span!(
        tracing::Level::INFO,
        "service",
        service.name = "alertrelay",
        service.version = env!("CARGO_PKG_VERSION"),
    )
    .entered();

    info!(
        config_path = %cli.config,
        log_level = log_level.as_str(),
        log_format = log_format.as_str(),
        trial_mode = TRIAL_MODE,
        "alertrelay agent starting"
    );

    // ── 3. Metrics registry ─────────────────────────────────────────
    let metrics = Arc::new(IntegrationMetrics::new());
    let metrics_port: Arc<dyn MetricsPort> = metrics.clone();

    // ── 4. Alert cache ──────────────────────────────────────────────
    let admission = config.vendor.admission_filter();
    info!(
        max_items = config.cache.max_items,
        max_age_hours = config.cache.max_age_hours,
        type_filter = %admission.key(),
        "alert cache initialized"
    );
    let cache = Arc::new(CacheService::new(
        admission,
        config.cache.max_items,
        config.cache.max_age_ms(),
        Arc::clone(&metrics_port),
    ));

    // ── 5. Shutdown token ───────────────────────────────────────────
    let cancel = crate::shutdown::create_shutdown_token();

    // ── 6. Vendor gateway ───────────────────────────────────────────
    let settings = config.gateway.to_settings(&config.vendor);
    let gateway: Arc<dyn VendorGateway> = Arc::new(
        VendorClient::new(settings, Arc::clone(&metrics_port), cancel.clone())
            .map_err(|e| anyhow::anyhow!("vendor gateway init failed: {e}"))?,
    );
    info!(
        base_url = %config.vendor.url,
        queue_size = config.gateway.queue_size,
        max_retries = config.gateway.max_retries,
        "vendor gateway initialized"
    );

    let bulk: Option<Arc<dyn BulkFeedSource>> = match config.vendor.mode {
        IngestMode::Bulk => {
            let download_url = config
                .vendor
                .download_url
                .clone()
                .unwrap_or_default();
            info!(%download_url, "bulk ingestion mode enabled");
            Some(Arc::new(
                BulkFeedClient::new(
                    download_url,
                    config.vendor.client_id.clone(),
                    config.vendor.client_secret.clone(),
                    DEFAULT_REQUEST_TIMEOUT,
                )
                .map_err(|e| anyhow::anyhow!("bulk feed init failed: {e}"))?,
            ))
        }
        IngestMode::Cursor => None,
    };

    // ── 7. Polling engine ───────────────────────────────────────────
    // Not started here: the first inbound request that carries credentials
    // bootstraps it lazily through the dispatcher.
    let list_ids = config.vendor.watch_list_ids();
    let polling = Arc::new(PollingEngine::new(
        Arc::clone(&gateway),
        bulk,
        Arc::clone(&cache),
        Arc::clone(&metrics_port),
        PollingConfig {
            poll_interval: Duration::from_secs(config.vendor.poll_interval_secs),
            lists_interval: LISTS_POLL_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: MAX_PAGES,
            pacing_min: PAGE_PACING_MIN,
            pacing_max: PAGE_PACING_MAX,
            list_ids: list_ids.clone(),
        },
        cancel.clone(),
    ));

    // ── 8. Dispatcher ───────────────────────────────────────────────
    let lookup = LookupService::new(
        Arc::clone(&gateway),
        Arc::clone(&cache),
        MAX_PAGE_SIZE,
        TRIAL_MODE,
    );
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&cache),
        gateway,
        Arc::new(HtmlRenderer),
        lookup,
        Arc::clone(&polling),
        metrics_port,
        DispatchConfig {
            list_ids,
            alert_types: config.vendor.watch_type_names(),
            timezone: config.vendor.timezone.clone(),
            has_credentials: true,
        },
    ));

    // ── 9. API server ───────────────────────────────────────────────
    let state = Arc::new(AppState::new(
        dispatcher,
        Arc::clone(&polling),
        cache,
        metrics,
    ));
    let bind_address = config.agent.bind_address.clone();
    let http_port = config.agent.http_port;
    let swagger_ui = config.agent.swagger_ui;
    let http_shutdown = cancel.clone();
    let http_handle = tokio::spawn(async move {
        if let Err(e) = run_http_server(
            state,
            &bind_address,
            http_port,
            swagger_ui,
            http_shutdown.cancelled_owned(),
        )
        .await
        {
            tracing::error!(error = %e, "API server failed");
        }
    });

    // ── 10. Block until shutdown ────────────────────────────────────
    cancel.cancelled().await;
    info!("shutdown signal received");
    polling.shutdown();
    if tokio::time::timeout(GRACEFUL_SHUTDOWN_TIMEOUT, http_handle)
        .await
        .is_err()
    {
        warn!("API server did not drain in time, exiting anyway");
    }
    info!("alertrelay agent stopped");
    Ok(())
}
