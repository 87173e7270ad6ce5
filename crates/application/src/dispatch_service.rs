use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use domain::alert::cache::ReadFilter;
use domain::alert::entity::Alert;
use domain::lookup::entity::Indicator;
use domain::vendor::entity::ApiRequest;
use domain::vendor::error::GatewayError;
use ports::secondary::alert_renderer::AlertRenderer;
use ports::secondary::metrics_port::MetricsPort;
use ports::secondary::vendor_gateway::VendorGateway;

use crate::cache_service::CacheService;
use crate::filter_registry::FilterRegistry;
use crate::lookup_service::{IndicatorResult, LookupService};
use crate::polling_service::PollingEngine;
use crate::wire::{ALERTS_ROUTE, parse_alerts_page, parse_single_alert};

// ── Error shape ─────────────────────────────────────────────────────

/// Coarse classification used by the transport layer to pick an HTTP
/// status. Not serialized; the wire shape is `{detail, err?, status?}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionErrorKind {
    /// Malformed inbound payload (missing/unknown action, bad fields).
    BadRequest,
    /// The vendor answered with a failure status.
    Upstream,
    /// Discarded by the gateway queue (full or timed out).
    Queue,
    /// Credential or configuration failure.
    Config,
    #[default]
    Internal,
}

/// Error surfaced to the requester: a short human string, an optional
/// machine-readable parse of the underlying failure, and the upstream HTTP
/// status when one applies.
#[derive(Debug, thiserror::Error, Serialize)]
#[error("{detail}")]
pub struct ActionError {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip)]
    pub kind: ActionErrorKind,
}

impl ActionError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            err: None,
            status: None,
            kind: ActionErrorKind::BadRequest,
        }
    }
}

impl From<GatewayError> for ActionError {
    fn from(e: GatewayError) -> Self {
        let kind = match &e {
            GatewayError::QueueFull | GatewayError::QueueTimeout => ActionErrorKind::Queue,
            GatewayError::Credentials(_) | GatewayError::AuthRejected => ActionErrorKind::Config,
            GatewayError::RateLimited { .. } | GatewayError::Upstream { .. } => {
                ActionErrorKind::Upstream
            }
            GatewayError::Network(_) | GatewayError::Malformed(_) | GatewayError::Unavailable => {
                ActionErrorKind::Internal
            }
        };
        Self {
            status: e.status(),
            detail: e.to_string(),
            err: None,
            kind,
        }
    }
}

// ── Action payloads ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LookupPayload {
    pub entities: Vec<Indicator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAlertsPayload {
    #[serde(default)]
    pub since_timestamp: Option<i64>,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAlertByIdPayload {
    pub alert_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderDetailPayload {
    pub alert_id: String,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenderNotificationPayload {
    pub name: String,
}

/// The closed action set, discriminated by the payload's `action` field.
#[derive(Debug)]
pub enum ActionRequest {
    Lookup(LookupPayload),
    GetAlerts(GetAlertsPayload),
    GetAlertById(GetAlertByIdPayload),
    RenderAlertDetail(RenderDetailPayload),
    RenderAlertNotification(RenderNotificationPayload),
}

impl ActionRequest {
    /// Parse an inbound payload. Distinguishes a missing discriminator from
    /// an unknown one, and reports field-level errors for a known action.
    pub fn parse(payload: &Value) -> Result<Self, ActionError> {
        let Some(action) = payload.get("action").and_then(Value::as_str) else {
            return Err(ActionError::bad_request("Missing action in payload"));
        };

        fn fields<T: serde::de::DeserializeOwned>(
            action: &str,
            payload: &Value,
        ) -> Result<T, ActionError> {
            serde_json::from_value(payload.clone()).map_err(|e| ActionError {
                detail: format!("Invalid payload for action '{action}'"),
                err: Some(Value::String(e.to_string())),
                status: None,
                kind: ActionErrorKind::BadRequest,
            })
        }

        match action {
            "lookup" => Ok(Self::Lookup(fields(action, payload)?)),
            "getAlerts" => Ok(Self::GetAlerts(fields(action, payload)?)),
            "getAlertById" => Ok(Self::GetAlertById(fields(action, payload)?)),
            "renderAlertDetail" => Ok(Self::RenderAlertDetail(fields(action, payload)?)),
            "renderAlertNotification" => {
                Ok(Self::RenderAlertNotification(fields(action, payload)?))
            }
            other => Err(ActionError::bad_request(format!("Unknown action: {other}"))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Lookup(_) => "lookup",
            Self::GetAlerts(_) => "getAlerts",
            Self::GetAlertById(_) => "getAlertById",
            Self::RenderAlertDetail(_) => "renderAlertDetail",
            Self::RenderAlertNotification(_) => "renderAlertNotification",
        }
    }
}

// ── Responses ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsResponse {
    pub alerts: Vec<Alert>,
    pub count: usize,
    pub last_alert_timestamp: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AlertByIdResponse {
    pub alert: Option<Alert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub html: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ActionResponse {
    Lookup(Vec<IndicatorResult>),
    Alerts(AlertsResponse),
    AlertById(AlertByIdResponse),
    Render(RenderResponse),
}

// ── Dispatcher ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct DispatchConfig {
    /// Configured list restriction applied to `getAlerts` reads and
    /// forwarded on single-alert fetches.
    pub list_ids: Vec<String>,
    /// Configured type restriction applied at read time. Admission already
    /// enforced the same set, so this only matters after reconfiguration.
    pub alert_types: Vec<String>,
    /// Default render timezone; per-request values win.
    pub timezone: Option<String>,
    /// Whether vendor credentials are present, gating the lazy polling
    /// bootstrap.
    pub has_credentials: bool,
}

/// Routes inbound actions across the cache, the gateway and the renderer.
pub struct Dispatcher {
    cache: Arc<CacheService>,
    gateway: Arc<dyn VendorGateway>,
    renderer: Arc<dyn AlertRenderer>,
    lookup: LookupService,
    polling: Arc<PollingEngine>,
    filters: FilterRegistry,
    metrics: Arc<dyn MetricsPort>,
    config: DispatchConfig,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cache: Arc<CacheService>,
        gateway: Arc<dyn VendorGateway>,
        renderer: Arc<dyn AlertRenderer>,
        lookup: LookupService,
        polling: Arc<PollingEngine>,
        metrics: Arc<dyn MetricsPort>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            cache,
            gateway,
            renderer,
            lookup,
            polling,
            filters: FilterRegistry::new(),
            metrics,
            config,
        }
    }

    /// Dispatch one inbound payload. The first credentialed request
    /// bootstraps polling, fire-and-forget.
    pub async fn dispatch(&self, payload: &Value) -> Result<ActionResponse, ActionError> {
        if self.config.has_credentials && !self.polling.is_initialized() {
            self.polling.ensure_started();
        }

        let request = ActionRequest::parse(payload)?;
        self.metrics.record_action(request.name());
        debug!(action = request.name(), "dispatching");

        match request {
            ActionRequest::Lookup(payload) => Ok(ActionResponse::Lookup(
                self.lookup.lookup(payload.entities).await,
            )),
            ActionRequest::GetAlerts(payload) => self.get_alerts(payload).await,
            ActionRequest::GetAlertById(payload) => {
                let (alert, message) = self.resolve_alert(&payload.alert_id).await?;
                Ok(ActionResponse::AlertById(AlertByIdResponse {
                    alert,
                    message,
                }))
            }
            ActionRequest::RenderAlertDetail(payload) => {
                let (alert, _) = self.resolve_alert(&payload.alert_id).await?;
                let html = match alert {
                    Some(alert) => {
                        let timezone = payload
                            .timezone
                            .as_deref()
                            .or(self.config.timezone.as_deref());
                        self.renderer
                            .render_detail(&alert, timezone)
                            .unwrap_or_else(|e| {
                                warn!(error = %e, alert_id = %alert.alert_id, "detail render failed");
                                String::new()
                            })
                    }
                    None => String::new(),
                };
                Ok(ActionResponse::Render(RenderResponse { html }))
            }
            ActionRequest::RenderAlertNotification(payload) => {
                let html = self
                    .renderer
                    .render_notification(&payload.name)
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "notification render failed");
                        String::new()
                    });
                Ok(ActionResponse::Render(RenderResponse { html }))
            }
        }
    }

    fn read_filter(&self) -> ReadFilter {
        ReadFilter {
            list_ids: (!self.config.list_ids.is_empty())
                .then(|| self.config.list_ids.iter().cloned().collect::<HashSet<_>>()),
            types: Some(self.filters.get_or_create(&self.config.alert_types)),
        }
    }

    async fn get_alerts(&self, payload: GetAlertsPayload) -> Result<ActionResponse, ActionError> {
        let filter = self.read_filter();

        // `count` wins over `sinceTimestamp`: a count request never filters
        // by time.
        let mut alerts = match payload.count {
            Some(_) => self.cache.get_all(None, &filter),
            None => self.cache.get_all(payload.since_timestamp, &filter),
        };

        if let Some(count) = payload.count {
            if alerts.len() < count {
                let mut request =
                    ApiRequest::get(ALERTS_ROUTE).with_query("pageSize", count.to_string());
                if !self.config.list_ids.is_empty() {
                    request = request.with_query("lists", self.config.list_ids.join(","));
                }
                let response = self.gateway.request(request).await?;
                if let Some(body) = response.into_json() {
                    self.cache.add(parse_alerts_page(&body).alerts);
                }
                alerts = self.cache.get_all(None, &filter);
            }
            alerts.truncate(count);
        }

        Ok(ActionResponse::Alerts(AlertsResponse {
            count: alerts.len(),
            last_alert_timestamp: alerts.first().map(|a| a.alert_timestamp),
            alerts,
        }))
    }

    /// Store hit first (explicit-fetch semantics, no TTL); on miss, one
    /// vendor fetch tolerating both single-alert response shapes. 404
    /// normalizes to a `None` alert, not an error.
    async fn resolve_alert(
        &self,
        alert_id: &str,
    ) -> Result<(Option<Alert>, Option<String>), ActionError> {
        if let Some(alert) = self.cache.get_by_id(alert_id) {
            return Ok((Some(alert), None));
        }

        let mut request = ApiRequest::get(format!("{ALERTS_ROUTE}/{alert_id}"));
        if !self.config.list_ids.is_empty() {
            request = request.with_query("lists", self.config.list_ids.join(","));
        }

        match self.gateway.request(request).await {
            Ok(response) => match response.into_json().as_ref().and_then(parse_single_alert) {
                Some(alert) => Ok((Some(alert), None)),
                None => {
                    warn!(alert_id, "single-alert response had no usable alert");
                    Ok((None, Some("Alert not found".to_string())))
                }
            },
            Err(e) if e.is_not_found() => Ok((None, Some("Alert not found".to_string()))),
            Err(e) => Err(e.into()),
        }
    }
}
