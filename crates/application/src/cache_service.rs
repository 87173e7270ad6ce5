use std::sync::{Arc, Mutex, PoisonError};

use domain::alert::cache::{AddOutcome, AlertCache, ReadFilter};
use domain::alert::entity::{Alert, WatchList};
use domain::alert::filter::TypeFilter;
use ports::secondary::metrics_port::MetricsPort;

use crate::epoch_ms;

/// Mutex-guarded facade over the alert cache.
///
/// All operations are synchronous from the caller's point of view; the lock
/// is held only for the duration of one cache operation, never across an
/// await point.
pub struct CacheService {
    inner: Mutex<AlertCache>,
    metrics: Arc<dyn MetricsPort>,
}

impl CacheService {
    pub fn new(
        admission: TypeFilter,
        max_items: usize,
        max_age_ms: i64,
        metrics: Arc<dyn MetricsPort>,
    ) -> Self {
        Self {
            inner: Mutex::new(AlertCache::new(admission, max_items, max_age_ms)),
            metrics,
        }
    }

    /// Admit a batch. Admission rules (type filter, first-write-wins,
    /// age bound, eviction) live in the cache engine.
    pub fn add(&self, alerts: Vec<Alert>) -> AddOutcome {
        let outcome = self.lock().add(alerts, epoch_ms());
        self.metrics.record_alerts_admitted(outcome.added as u64);
        self.metrics.set_cached_alerts(outcome.total as u64);
        outcome
    }

    pub fn get_all(&self, since_ms: Option<i64>, filter: &ReadFilter) -> Vec<Alert> {
        self.lock().get_all(since_ms, filter, epoch_ms())
    }

    pub fn get_by_id(&self, id: &str) -> Option<Alert> {
        self.lock().get_by_id(id).cloned()
    }

    pub fn latest_timestamp(&self) -> Option<i64> {
        self.lock().latest_timestamp()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn lists(&self) -> Vec<WatchList> {
        self.lock().lists().to_vec()
    }

    pub fn set_lists(&self, lists: Vec<WatchList>) {
        self.lock().set_lists(lists);
    }

    pub fn clear(&self) {
        self.lock().clear();
        self.metrics.set_cached_alerts(0);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AlertCache> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
