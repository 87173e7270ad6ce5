use serde::Serialize;

/// Mutable bookkeeping for the alerts-poll loop.
///
/// Created on the first poll, updated after each completed cycle, reset on
/// reconfiguration. Owned exclusively by the polling engine; everything else
/// sees read-only snapshots.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollingState {
    /// Completion time of the last cycle (epoch ms).
    pub last_poll_time: Option<i64>,
    /// Resumption cursor extracted from the last page response.
    pub last_cursor: Option<String>,
    /// Alerts processed by the last cycle.
    pub alert_count: u64,
    /// Alerts processed since the state was created.
    pub total_alerts_processed: u64,
    /// Bulk-variant resumption watermark (max numeric archive entry seen).
    pub last_since: Option<u64>,
}

impl PollingState {
    /// Record a completed alerts-poll cycle.
    pub fn record_cycle(&mut self, now_ms: i64, cursor: Option<String>, processed: u64) {
        self.last_poll_time = Some(now_ms);
        if cursor.is_some() {
            self.last_cursor = cursor;
        }
        self.alert_count = processed;
        self.total_alerts_processed += processed;
    }

    /// Record a completed bulk-variant cycle.
    pub fn record_bulk_cycle(&mut self, now_ms: i64, watermark: Option<u64>, processed: u64) {
        self.last_poll_time = Some(now_ms);
        if let Some(mark) = watermark {
            self.last_since = Some(self.last_since.map_or(mark, |prev| prev.max(mark)));
        }
        self.alert_count = processed;
        self.total_alerts_processed += processed;
    }
}
