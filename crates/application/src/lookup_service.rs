use std::sync::Arc;

use serde::Serialize;

use domain::alert::entity::Alert;
use domain::lookup::entity::Indicator;
use domain::lookup::private_ip::remove_private_ips;
use domain::vendor::entity::ApiRequest;
use ports::secondary::vendor_gateway::VendorGateway;

use crate::cache_service::CacheService;
use crate::parallel::{TaggedRequest, parallel_tagged_requests};
use crate::wire::{ALERTS_ROUTE, parse_alerts_page};

/// Compile-time trial flag: lookup responses carry counts but no alert
/// bodies when the `trial-mode` feature is on.
pub const TRIAL_MODE: bool = cfg!(feature = "trial-mode");

#[derive(Debug, Serialize)]
pub struct IndicatorResult {
    pub entity: Indicator,
    /// `None` when no alerts matched the indicator.
    pub data: Option<IndicatorData>,
}

#[derive(Debug, Serialize)]
pub struct IndicatorData {
    pub summary: Vec<String>,
    pub details: IndicatorDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorDetails {
    pub alerts: Vec<Alert>,
    pub alert_count: usize,
}

/// Parallel per-indicator alert search.
pub struct LookupService {
    gateway: Arc<dyn VendorGateway>,
    cache: Arc<CacheService>,
    /// `pageSize` per search request; a full page is reported as `N+`.
    page_size: usize,
    trial_mode: bool,
}

impl LookupService {
    pub fn new(
        gateway: Arc<dyn VendorGateway>,
        cache: Arc<CacheService>,
        page_size: usize,
        trial_mode: bool,
    ) -> Self {
        Self {
            gateway,
            cache,
            page_size,
            trial_mode,
        }
    }

    /// Search each indicator, admit every hit into the cache so follow-up
    /// renders are warm, and assemble per-indicator results.
    pub async fn lookup(&self, indicators: Vec<Indicator>) -> Vec<IndicatorResult> {
        let indicators = remove_private_ips(indicators);
        if indicators.is_empty() {
            return Vec::new();
        }

        let requests = indicators
            .iter()
            .map(|indicator| TaggedRequest {
                result_id: indicator.value.clone(),
                request: ApiRequest::get(ALERTS_ROUTE)
                    .with_query("query", &indicator.value)
                    .with_query("pageSize", self.page_size.to_string()),
            })
            .collect();

        let results = parallel_tagged_requests(self.gateway.as_ref(), requests).await;

        let mut per_indicator: Vec<Vec<Alert>> = Vec::with_capacity(indicators.len());
        let mut all_hits: Vec<Alert> = Vec::new();
        for indicator in &indicators {
            let alerts = results
                .iter()
                .find(|r| r.result_id == indicator.value)
                .and_then(|r| r.result.as_ref())
                .map(|body| parse_alerts_page(body).alerts)
                .unwrap_or_default();
            all_hits.extend(alerts.iter().cloned());
            per_indicator.push(alerts);
        }
        if !all_hits.is_empty() {
            self.cache.add(all_hits);
        }

        indicators
            .into_iter()
            .zip(per_indicator)
            .map(|(entity, alerts)| {
                let data = (!alerts.is_empty()).then(|| self.indicator_data(alerts));
                IndicatorResult { entity, data }
            })
            .collect()
    }

    fn indicator_data(&self, alerts: Vec<Alert>) -> IndicatorData {
        let count = alerts.len();
        let suffix = if count == self.page_size { "+" } else { "" };
        IndicatorData {
            summary: vec![format!("Alerts: {count}{suffix}")],
            details: IndicatorDetails {
                alerts: if self.trial_mode { Vec::new() } else { alerts },
                alert_count: count,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::alert::filter::TypeFilter;
    use domain::vendor::entity::ApiResponse;
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

    fn indicator(value: &str, is_ip: bool) -> Indicator {
        serde_json::from_value(json!({"value": value, "isIP": is_ip})).unwrap()
    }

    fn one_alert_page() -> ApiResponse {
        ApiResponse::Json(json!({
            "alerts": [{
                "alertId": "X",
                "alertTimestamp": crate::epoch_ms() - 1_000,
                "alertType": {"name": "flash"},
                "headline": "H"
            }]
        }))
    }

    #[tokio::test]
    async fn cold_lookup_hits_vendor_once_and_warms_cache() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(one_alert_page())]));
        let cache = cache();
        let svc = LookupService::new(gateway.clone(), cache.clone(), 40, false);

        let results = svc.lookup(vec![indicator("1.1.1.1", true)]).await;

        assert_eq!(gateway.request_count(), 1);
        assert_eq!(results.len(), 1);
        let data = results[0].data.as_ref().unwrap();
        assert_eq!(data.summary, vec!["Alerts: 1"]);
        assert_eq!(data.details.alert_count, 1);
        assert_eq!(data.details.alerts.len(), 1);
        assert!(cache.get_by_id("X").is_some());
    }

    #[tokio::test]
    async fn trial_mode_returns_counts_only() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(one_alert_page())]));
        let svc = LookupService::new(gateway, cache(), 40, true);

        let results = svc.lookup(vec![indicator("1.1.1.1", true)]).await;
        let data = results[0].data.as_ref().unwrap();
        assert_eq!(data.summary, vec!["Alerts: 1"]);
        assert!(data.details.alerts.is_empty());
        assert_eq!(data.details.alert_count, 1);
    }

    #[tokio::test]
    async fn private_ips_are_never_searched() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(one_alert_page())]));
        let svc = LookupService::new(gateway.clone(), cache(), 40, false);

        let results = svc
            .lookup(vec![indicator("10.0.0.5", true), indicator("1.1.1.1", true)])
            .await;

        assert_eq!(gateway.request_count(), 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entity.value, "1.1.1.1");
    }

    #[tokio::test]
    async fn no_hits_yields_null_data() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(ApiResponse::Json(
            json!({"alerts": []}),
        ))]));
        let svc = LookupService::new(gateway, cache(), 40, false);

        let results = svc.lookup(vec![indicator("9.9.9.9", true)]).await;
        assert!(results[0].data.is_none());
    }

    #[tokio::test]
    async fn full_page_gets_plus_suffix() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Ok(ApiResponse::Json(json!({
            "alerts": [
                {"alertId": "a", "alertTimestamp": 1},
                {"alertId": "b", "alertTimestamp": 2}
            ]
        })))]));
        let svc = LookupService::new(gateway, cache(), 2, false);

        let results = svc.lookup(vec![indicator("1.1.1.1", true)]).await;
        let data = results[0].data.as_ref().unwrap();
        assert_eq!(data.summary, vec!["Alerts: 2+"]);
    }

    #[tokio::test]
    async fn failed_search_tolerated_per_indicator() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(domain::vendor::error::GatewayError::QueueFull),
            Ok(one_alert_page()),
        ]));
        let svc = LookupService::new(gateway, cache(), 40, false);

        let results = svc
            .lookup(vec![indicator("2.2.2.2", true), indicator("1.1.1.1", true)])
            .await;
        assert!(results[0].data.is_none());
        assert!(results[1].data.is_some());
    }
}
