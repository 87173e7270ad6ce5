use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use domain::polling::entity::PollingState;
use domain::vendor::entity::ApiRequest;
use domain::vendor::error::GatewayError;
use ports::secondary::bulk_feed::BulkFeedSource;
use ports::secondary::metrics_port::MetricsPort;
use ports::secondary::vendor_gateway::VendorGateway;

use crate::cache_service::CacheService;
use crate::epoch_ms;
use crate::wire::{ALERTS_ROUTE, LISTS_ROUTE, parse_alerts_page, parse_lists_catalog};

#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Alerts-poll period. The config layer enforces the 30 s floor.
    pub poll_interval: Duration,
    pub lists_interval: Duration,
    /// Alerts requested per page.
    pub page_size: usize,
    /// Pagination stops after this many pages per cycle.
    pub max_pages: usize,
    /// Inter-page pacing bounds.
    pub pacing_min: Duration,
    pub pacing_max: Duration,
    /// Subscription lists restricting the alerts query; empty means all.
    pub list_ids: Vec<String>,
}

/// Scheduled feed ingestion: an alerts loop with cursor resumption and
/// a lists-catalog refresh loop.
///
/// Both loops are single-shot timers that reschedule after the cycle
/// completes, so cycles never overlap; a busy flag additionally suppresses
/// re-entry between the immediate bootstrap poll and the first timer fire.
pub struct PollingEngine {
    gateway: Arc<dyn VendorGateway>,
    /// When set, cycles use the signed bulk download instead of cursor
    /// pagination.
    bulk: Option<Arc<dyn BulkFeedSource>>,
    cache: Arc<CacheService>,
    metrics: Arc<dyn MetricsPort>,
    config: PollingConfig,
    state: Mutex<PollingState>,
    initialized: AtomicBool,
    alerts_busy: AtomicBool,
    lists_busy: AtomicBool,
    parent_cancel: CancellationToken,
    loops_cancel: Mutex<Option<CancellationToken>>,
}

impl PollingEngine {
    pub fn new(
        gateway: Arc<dyn VendorGateway>,
        bulk: Option<Arc<dyn BulkFeedSource>>,
        cache: Arc<CacheService>,
        metrics: Arc<dyn MetricsPort>,
        config: PollingConfig,
        parent_cancel: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            bulk,
            cache,
            metrics,
            config,
            state: Mutex::new(PollingState::default()),
            initialized: AtomicBool::new(false),
            alerts_busy: AtomicBool::new(false),
            lists_busy: AtomicBool::new(false),
            parent_cancel,
            loops_cancel: Mutex::new(None),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn state_snapshot(&self) -> PollingState {
        self.state_lock().clone()
    }

    /// Start both loops: reset the polling state, fire one immediate alerts
    /// poll and one immediate lists poll, then reschedule on the configured
    /// periods. Idempotent until [`shutdown`](Self::shutdown).
    pub fn ensure_started(self: &Arc<Self>) {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        *self.state_lock() = PollingState::default();
        let token = self.parent_cancel.child_token();
        *self.loops_lock() = Some(token.clone());

        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            lists_interval_secs = self.config.lists_interval.as_secs(),
            "polling initialized"
        );

        let engine = Arc::clone(self);
        let alerts_token = token.clone();
        tokio::spawn(async move {
            engine.poll_alerts_once().await;
            loop {
                tokio::select! {
                    () = alerts_token.cancelled() => break,
                    () = tokio::time::sleep(engine.config.poll_interval) => {}
                }
                engine.poll_alerts_once().await;
            }
        });

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.poll_lists_once().await;
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(engine.config.lists_interval) => {}
                }
                engine.poll_lists_once().await;
            }
        });
    }

    /// Cancel both loops. The next credentialed request re-bootstraps.
    pub fn shutdown(&self) {
        if let Some(token) = self.loops_lock().take() {
            token.cancel();
        }
        self.initialized.store(false, Ordering::SeqCst);
        info!("polling shut down");
    }

    /// Run one alerts-poll cycle. Re-entry while a cycle is running is a
    /// no-op.
    pub async fn poll_alerts_once(&self) {
        if self.alerts_busy.swap(true, Ordering::SeqCst) {
            debug!("alerts poll already running, skipping");
            return;
        }
        let outcome = match self.bulk.clone() {
            Some(bulk) => self.run_bulk_cycle(bulk.as_ref()).await,
            None => self.run_cursor_cycle().await,
        };
        self.metrics.record_poll_cycle("alerts", outcome);
        self.alerts_busy.store(false, Ordering::SeqCst);
    }

    /// Refresh the lists catalog once. A failed or empty refresh keeps the
    /// previous catalog.
    pub async fn poll_lists_once(&self) {
        if self.lists_busy.swap(true, Ordering::SeqCst) {
            return;
        }
        let outcome = match self.gateway.request(ApiRequest::get(LISTS_ROUTE)).await {
            Ok(response) => match response.into_json() {
                Some(body) => {
                    let catalog = parse_lists_catalog(&body);
                    if catalog.is_empty() {
                        warn!("lists refresh returned no entries, keeping previous catalog");
                        "empty"
                    } else {
                        debug!(list_count = catalog.len(), "lists catalog refreshed");
                        self.cache.set_lists(catalog);
                        "success"
                    }
                }
                None => "error",
            },
            Err(e) => {
                warn!(error = %e, "lists refresh failed, keeping previous catalog");
                "error"
            }
        };
        self.metrics.record_poll_cycle("lists", outcome);
        self.lists_busy.store(false, Ordering::SeqCst);
    }

    async fn run_cursor_cycle(&self) -> &'static str {
        let mut cursor = self.state_lock().last_cursor.clone();
        let mut processed: u64 = 0;

        for page_index in 0..self.config.max_pages {
            let mut request = ApiRequest::get(ALERTS_ROUTE)
                .with_query("pageSize", self.config.page_size.to_string());
            if let Some(ref c) = cursor {
                request = request.with_query("from", c.clone());
            }
            if !self.config.list_ids.is_empty() {
                request = request.with_query("lists", self.config.list_ids.join(","));
            }

            let body = match self.gateway.request(request).await {
                Ok(response) => match response.into_json() {
                    Some(body) => body,
                    None => {
                        warn!("alerts page was not JSON, aborting cycle");
                        return "error";
                    }
                },
                Err(GatewayError::RateLimited { attempts }) => {
                    // Cursor progress from already-applied pages is kept;
                    // the next scheduled run resumes from it.
                    warn!(attempts, "rate limited, aborting alerts cycle");
                    return "rate_limited";
                }
                Err(e) => {
                    warn!(error = %e, page_index, "alerts poll failed, aborting cycle");
                    return "error";
                }
            };

            let page = parse_alerts_page(&body);
            let fetched = page.alerts.len();
            processed += fetched as u64;
            self.cache.add(page.alerts);

            if let Some(next) = page.next_cursor {
                cursor = Some(next);
                self.state_lock().last_cursor.clone_from(&cursor);
            }

            // A short page means no newer alerts are waiting.
            if fetched < self.config.page_size {
                break;
            }
            if page_index + 1 < self.config.max_pages {
                tokio::time::sleep(self.pacing()).await;
            }
        }

        self.state_lock().record_cycle(epoch_ms(), cursor, processed);
        info!(processed, "alerts poll cycle complete");
        "success"
    }

    async fn run_bulk_cycle(&self, bulk: &dyn BulkFeedSource) -> &'static str {
        let since = self.state_lock().last_since;
        match bulk.fetch_since(since).await {
            Ok(entries) => {
                let mut processed: u64 = 0;
                let mut watermark: Option<u64> = None;
                for entry in entries {
                    processed += entry.alerts.len() as u64;
                    self.cache.add(entry.alerts);
                    if let Some(mark) = entry.watermark {
                        watermark = Some(watermark.map_or(mark, |w| w.max(mark)));
                    }
                }
                self.state_lock()
                    .record_bulk_cycle(epoch_ms(), watermark, processed);
                info!(processed, ?watermark, "bulk cycle complete");
                "success"
            }
            Err(GatewayError::RateLimited { attempts }) => {
                warn!(attempts, "rate limited, aborting bulk cycle");
                "rate_limited"
            }
            Err(e) => {
                warn!(error = %e, "bulk cycle failed");
                "error"
            }
        }
    }

    /// Inter-page pacing with cheap jitter inside the configured bounds.
    fn pacing(&self) -> Duration {
        let spread_ms = u64::try_from(
            self.config
                .pacing_max
                .saturating_sub(self.config.pacing_min)
                .as_millis(),
        )
        .unwrap_or(0);
        if spread_ms == 0 {
            return self.config.pacing_min;
        }
        let nanos = std::time::SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::from(d.subsec_nanos()))
            .unwrap_or(0);
        self.config.pacing_min + Duration::from_millis(nanos % spread_ms)
    }

    fn state_lock(&self) -> MutexGuard<'_, PollingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn loops_lock(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.loops_cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;

    use domain::alert::filter::TypeFilter;
    use domain::vendor::entity::{ApiResponse, BulkEntry};
    use ports::test_utils::{NoopMetrics, ScriptedGateway};
    use serde_json::json;

    fn cache() -> Arc<CacheService> {
        Arc::new(CacheService::new(
            TypeFilter::admit_all(),
            100,
            72 * 3_600_000,
            Arc::new(NoopMetrics),
        ))
    }

    fn config(page_size: usize) -> PollingConfig {
        PollingConfig {
            poll_interval: Duration::from_secs(60),
            lists_interval: Duration::from_secs(60),
            page_size,
            max_pages: 50,
            pacing_min: Duration::ZERO,
            pacing_max: Duration::ZERO,
            list_ids: Vec::new(),
        }
    }

    fn engine(gateway: Arc<ScriptedGateway>, page_size: usize) -> Arc<PollingEngine> {
        Arc::new(PollingEngine::new(
            gateway,
            None,
            cache(),
            Arc::new(NoopMetrics),
            config(page_size),
            CancellationToken::new(),
        ))
    }

    fn page(ids: &[&str], next_cursor: Option<&str>) -> ApiResponse {
        let now = crate::epoch_ms();
        let alerts: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                json!({
                    "alertId": id,
                    "alertTimestamp": now - 1_000 - i as i64,
                    "alertType": {"name": "flash"}
                })
            })
            .collect();
        let mut body = json!({"alerts": alerts});
        if let Some(cursor) = next_cursor {
            body["nextPage"] = json!(format!("/api/v1/alerts?from={cursor}&pageSize=10"));
        }
        ApiResponse::Json(body)
    }

    fn query_value(request: &domain::vendor::entity::ApiRequest, name: &str) -> Option<String> {
        request
            .query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    #[tokio::test]
    async fn pages_until_short_page_and_resumes_cursor() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok(page(&["a", "b"], Some("CUR2"))),
            Ok(page(&["c"], Some("CUR3"))),
            Ok(page(&[], None)),
        ]));
        let eng = engine(gateway.clone(), 2);

        eng.poll_alerts_once().await;
        let seen = gateway.seen();
        assert_eq!(seen.len(), 2, "short page must stop pagination");
        assert!(query_value(&seen[0], "from").is_none());
        assert_eq!(query_value(&seen[1], "from").as_deref(), Some("CUR2"));

        let state = eng.state_snapshot();
        assert_eq!(state.last_cursor.as_deref(), Some("CUR3"));
        assert_eq!(state.alert_count, 3);
        assert_eq!(state.total_alerts_processed, 3);
        assert!(state.last_poll_time.is_some());

        // Second cycle resumes from the stored cursor.
        eng.poll_alerts_once().await;
        let seen = gateway.seen();
        assert_eq!(query_value(&seen[2], "from").as_deref(), Some("CUR3"));
    }

    #[tokio::test]
    async fn rate_limit_aborts_cycle_and_preserves_cursor() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok(page(&["a", "b"], Some("CUR2"))),
            Err(GatewayError::RateLimited { attempts: 4 }),
            Ok(page(&[], None)),
        ]));
        let eng = engine(gateway.clone(), 2);

        eng.poll_alerts_once().await;
        let state = eng.state_snapshot();
        assert_eq!(state.last_cursor.as_deref(), Some("CUR2"));
        assert!(state.last_poll_time.is_none(), "aborted cycle does not complete");

        eng.poll_alerts_once().await;
        let seen = gateway.seen();
        assert_eq!(query_value(&seen[2], "from").as_deref(), Some("CUR2"));
    }

    #[tokio::test]
    async fn list_ids_restrict_the_query() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(page(&[], None))]));
        let mut cfg = config(10);
        cfg.list_ids = vec!["1".to_string(), "2".to_string()];
        let eng = Arc::new(PollingEngine::new(
            gateway.clone(),
            None,
            cache(),
            Arc::new(NoopMetrics),
            cfg,
            CancellationToken::new(),
        ));

        eng.poll_alerts_once().await;
        let seen = gateway.seen();
        assert_eq!(query_value(&seen[0], "lists").as_deref(), Some("1,2"));
        assert_eq!(query_value(&seen[0], "pageSize").as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn lists_refresh_replaces_catalog_and_survives_failure() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok(ApiResponse::Json(json!({
                "lists": {"TOPICS": [{"id": "1", "name": "Infrastructure"}]}
            }))),
            Err(GatewayError::Unavailable),
            Ok(ApiResponse::Json(json!({"lists": {}}))),
        ]));
        let eng = engine(gateway, 10);

        eng.poll_lists_once().await;
        assert_eq!(eng.cache.lists().len(), 1);

        eng.poll_lists_once().await;
        assert_eq!(eng.cache.lists().len(), 1, "failure keeps previous catalog");

        eng.poll_lists_once().await;
        assert_eq!(eng.cache.lists().len(), 1, "empty refresh keeps previous catalog");
    }

    struct ScriptedBulk {
        batches: Mutex<std::collections::VecDeque<Result<Vec<BulkEntry>, GatewayError>>>,
        seen_since: Mutex<Vec<Option<u64>>>,
    }

    impl BulkFeedSource for ScriptedBulk {
        fn fetch_since<'a>(
            &'a self,
            since: Option<u64>,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<BulkEntry>, GatewayError>> + Send + 'a>>
        {
            self.seen_since
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(since);
            let next = self
                .batches
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or(Err(GatewayError::Unavailable));
            Box::pin(async move { next })
        }
    }

    #[tokio::test]
    async fn bulk_cycle_advances_watermark() {
        let now = crate::epoch_ms();
        let entry = |mark: u64, id: &str| BulkEntry {
            watermark: Some(mark),
            alerts: vec![domain::alert::entity::Alert {
                alert_id: id.to_string(),
                alert_timestamp: now - 1_000,
                ..domain::alert::entity::Alert::default()
            }],
        };
        let bulk = Arc::new(ScriptedBulk {
            batches: Mutex::new(
                vec![
                    Ok(vec![entry(300, "a"), entry(301, "b")]),
                    Err(GatewayError::Unavailable),
                ]
                .into(),
            ),
            seen_since: Mutex::new(Vec::new()),
        });
        let eng = Arc::new(PollingEngine::new(
            Arc::new(ScriptedGateway::default()),
            Some(bulk.clone()),
            cache(),
            Arc::new(NoopMetrics),
            config(10),
            CancellationToken::new(),
        ));

        eng.poll_alerts_once().await;
        let state = eng.state_snapshot();
        assert_eq!(state.last_since, Some(301));
        assert_eq!(state.total_alerts_processed, 2);
        assert!(eng.cache.get_by_id("a").is_some());

        // Failed cycle leaves the watermark alone; the next request still
        // resumes from it.
        eng.poll_alerts_once().await;
        assert_eq!(eng.state_snapshot().last_since, Some(301));
        let seen = bulk
            .seen_since
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        assert_eq!(seen, vec![None, Some(301)]);
    }

    #[tokio::test]
    async fn ensure_started_is_idempotent_and_shutdown_rearms() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok(page(&[], None)),
            Ok(ApiResponse::Json(json!({"lists": {}}))),
        ]));
        let eng = engine(gateway.clone(), 10);

        eng.ensure_started();
        assert!(eng.is_initialized());
        eng.ensure_started();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(gateway.request_count() >= 2, "immediate polls fired once");

        eng.shutdown();
        assert!(!eng.is_initialized());
    }
}
