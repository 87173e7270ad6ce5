/// Secondary port for operational counters.
///
/// Every method has a no-op default so application code can record freely
/// while tests and slim deployments plug in a unit implementation.
pub trait MetricsPort: Send + Sync {
    /// One outbound vendor request finished; `outcome` is a low-cardinality
    /// label such as `success`, `rate_limited`, `upstream_error`.
    fn record_vendor_request(&self, _outcome: &str) {}

    /// A request was discarded by the gateway queue (`full` or `timeout`).
    fn record_queue_drop(&self, _reason: &str) {}

    /// One poll cycle finished with the given outcome.
    fn record_poll_cycle(&self, _kind: &str, _outcome: &str) {}

    /// Alerts admitted into the cache.
    fn record_alerts_admitted(&self, _count: u64) {}

    /// Current cache occupancy.
    fn set_cached_alerts(&self, _count: u64) {}

    /// One inbound action was dispatched.
    fn record_action(&self, _action: &str) {}
}
