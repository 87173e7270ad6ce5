use std::sync::Mutex;

use ports::secondary::metrics_port::MetricsPort;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

// ── Label types ─────────────────────────────────────────────────────

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ReasonLabels {
    pub reason: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct PollLabels {
    pub kind: String,
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ActionLabels {
    pub action: String,
}

// ── Integration metrics registry ────────────────────────────────────

/// Prometheus metrics for the integration process.
///
/// All metric families use interior mutability, so recording only needs
/// `&self`; wrap in `Arc` for multi-task sharing.
pub struct IntegrationMetrics {
    registry: Mutex<Registry>,
    pub vendor_requests_total: Family<OutcomeLabels, Counter>,
    pub queue_dropped_total: Family<ReasonLabels, Counter>,
    pub poll_cycles_total: Family<PollLabels, Counter>,
    pub alerts_admitted_total: Counter,
    pub cached_alerts: Gauge,
    pub actions_total: Family<ActionLabels, Counter>,
}

impl IntegrationMetrics {
    /// Create a registry with every metric registered under the
    /// `alertrelay` prefix.
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("alertrelay");

        let vendor_requests_total = Family::<OutcomeLabels, Counter>::default();
        registry.register(
            "vendor_requests",
            "Outbound vendor requests by outcome",
            vendor_requests_total.clone(),
        );

        let queue_dropped_total = Family::<ReasonLabels, Counter>::default();
        registry.register(
            "queue_dropped",
            "Requests discarded by the gateway queue",
            queue_dropped_total.clone(),
        );

        let poll_cycles_total = Family::<PollLabels, Counter>::default();
        registry.register(
            "poll_cycles",
            "Completed poll cycles by kind and outcome",
            poll_cycles_total.clone(),
        );

        let alerts_admitted_total = Counter::default();
        registry.register(
            "alerts_admitted",
            "Alerts admitted into the cache",
            alerts_admitted_total.clone(),
        );

        let cached_alerts = Gauge::default();
        registry.register(
            "cached_alerts",
            "Current alert cache occupancy",
            cached_alerts.clone(),
        );

        let actions_total = Family::<ActionLabels, Counter>::default();
        registry.register(
            "actions",
            "Dispatched inbound actions",
            actions_total.clone(),
        );

        Self {
            registry: Mutex::new(registry),
            vendor_requests_total,
            queue_dropped_total,
            poll_cycles_total,
            alerts_admitted_total,
            cached_alerts,
            actions_total,
        }
    }

    /// Text exposition of the registry, for the `/metrics` endpoint.
    pub fn encode_text(&self) -> String {
        let mut out = String::new();
        if let Ok(registry) = self.registry.lock()
            && let Err(e) = encode(&mut out, &registry)
        {
            tracing::warn!(error = %e, "metrics encoding failed");
        }
        out
    }
}

impl Default for IntegrationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsPort for IntegrationMetrics {
    fn record_vendor_request(&self, outcome: &str) {
        self.vendor_requests_total
            .get_or_create(&OutcomeLabels {
                outcome: outcome.to_string(),
            })
            .inc();
    }

    fn record_queue_drop(&self, reason: &str) {
        self.queue_dropped_total
            .get_or_create(&ReasonLabels {
                reason: reason.to_string(),
            })
            .inc();
    }

    fn record_poll_cycle(&self, kind: &str, outcome: &str) {
        self.poll_cycles_total
            .get_or_create(&PollLabels {
                kind: kind.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
    }

    fn record_alerts_admitted(&self, count: u64) {
        self.alerts_admitted_total.inc_by(count);
    }

    fn set_cached_alerts(&self, count: u64) {
        self.cached_alerts.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    fn record_action(&self, action: &str) {
        self.actions_total
            .get_or_create(&ActionLabels {
                action: action.to_string(),
            })
            .inc();
    }
}
