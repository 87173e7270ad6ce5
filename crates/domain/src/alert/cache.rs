use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use super::entity::{Alert, WatchList};
use super::filter::TypeFilter;

/// How many head entries are scanned for ordering violations before an
/// `add` pays for a full stable sort. The vendor returns newest-first, so
/// the common path never sorts.
const HEAD_SCAN_LEN: usize = 10;

/// Outcome of an admission pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    /// Alerts that survived admission and entered the sequence.
    pub added: usize,
    /// Sequence length after eviction.
    pub total: usize,
}

/// Read-time restriction. Never mutates the cache; both filters are
/// optional and compose with AND.
#[derive(Debug, Clone, Default)]
pub struct ReadFilter {
    /// Restrict to alerts matching at least one of these list ids
    /// (`listsMatched[*].id`). An alert with no `listsMatched` never matches.
    pub list_ids: Option<HashSet<String>>,
    /// Restrict by lowercased type-name set (empty filter admits all).
    /// Shared so concurrent requests with equal type-sets reuse one
    /// predicate instance.
    pub types: Option<Arc<TypeFilter>>,
}

impl ReadFilter {
    fn matches(&self, alert: &Alert) -> bool {
        if let Some(ref ids) = self.list_ids
            && !alert.matched_list_ids().iter().any(|id| ids.contains(id))
        {
            return false;
        }
        if let Some(ref types) = self.types
            && !types.matches(alert)
        {
            return false;
        }
        true
    }
}

/// Bounded, newest-first alert store with an id index and a lists catalog.
///
/// Admission rules (`add`): an alert is dropped when its type fails the
/// admission filter, when its id is already present (first write wins), or
/// when it is older than `max_age_ms`. Survivors are prepended; if the
/// sequence then exceeds `max_items` it is stable-sorted by timestamp
/// descending and truncated, evicting the oldest.
///
/// Time is passed in by the caller (`now_ms`), never read here.
#[derive(Debug)]
pub struct AlertCache {
    alerts: VecDeque<Alert>,
    index: HashMap<String, usize>,
    lists: Vec<WatchList>,
    admission: TypeFilter,
    max_items: usize,
    max_age_ms: i64,
}

impl AlertCache {
    pub fn new(admission: TypeFilter, max_items: usize, max_age_ms: i64) -> Self {
        Self {
            alerts: VecDeque::new(),
            index: HashMap::new(),
            lists: Vec::new(),
            admission,
            max_items,
            max_age_ms,
        }
    }

    /// Admit a batch of alerts. Returns how many entered and the resulting
    /// sequence length.
    pub fn add(&mut self, incoming: Vec<Alert>, now_ms: i64) -> AddOutcome {
        let mut survivors: Vec<Alert> = Vec::new();
        let mut batch_ids: HashSet<String> = HashSet::new();

        for alert in incoming {
            if !self.admission.matches(&alert) {
                continue;
            }
            if now_ms.saturating_sub(alert.alert_timestamp) > self.max_age_ms {
                continue;
            }
            if !alert.alert_id.is_empty() {
                // First write wins, both against the store and within the batch.
                if self.index.contains_key(&alert.alert_id)
                    || !batch_ids.insert(alert.alert_id.clone())
                {
                    continue;
                }
            }
            survivors.push(alert);
        }

        let added = survivors.len();
        if added == 0 {
            return AddOutcome {
                added: 0,
                total: self.alerts.len(),
            };
        }

        // Prepend the batch, preserving its newest-first order.
        for alert in survivors.into_iter().rev() {
            self.alerts.push_front(alert);
        }

        if !self.head_is_ordered() {
            let mut sorted: Vec<Alert> = self.alerts.drain(..).collect();
            sorted.sort_by_key(|a| std::cmp::Reverse(a.alert_timestamp));
            self.alerts = sorted.into();
        }

        if self.alerts.len() > self.max_items {
            self.alerts.truncate(self.max_items);
        }

        self.rebuild_index();
        AddOutcome {
            added,
            total: self.alerts.len(),
        }
    }

    /// Newest-first snapshot, optionally restricted to alerts strictly newer
    /// than `since_ms` and by a read filter. Trims an expired tail first.
    pub fn get_all(
        &mut self,
        since_ms: Option<i64>,
        filter: &ReadFilter,
        now_ms: i64,
    ) -> Vec<Alert> {
        self.trim_expired_tail(now_ms);
        self.alerts
            .iter()
            .filter(|a| since_ms.is_none_or(|since| a.alert_timestamp > since))
            .filter(|a| filter.matches(a))
            .cloned()
            .collect()
    }

    /// O(1) id lookup. Explicit-fetch semantics: no age check.
    pub fn get_by_id(&self, id: &str) -> Option<&Alert> {
        self.index.get(id).map(|&pos| &self.alerts[pos])
    }

    /// Timestamp of the newest cached alert.
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.alerts.front().map(|a| a.alert_timestamp)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn lists(&self) -> &[WatchList] {
        &self.lists
    }

    /// Replace the lists catalog. An empty replacement is ignored so a
    /// failed refresh never wipes the last known good catalog.
    pub fn set_lists(&mut self, lists: Vec<WatchList>) {
        if !lists.is_empty() {
            self.lists = lists;
        }
    }

    /// Drop the sequence and the index. The lists catalog survives.
    pub fn clear(&mut self) {
        self.alerts.clear();
        self.index.clear();
    }

    fn head_is_ordered(&self) -> bool {
        self.alerts
            .iter()
            .take(HEAD_SCAN_LEN)
            .zip(self.alerts.iter().take(HEAD_SCAN_LEN).skip(1))
            .all(|(a, b)| a.alert_timestamp >= b.alert_timestamp)
    }

    fn trim_expired_tail(&mut self, now_ms: i64) {
        let mut trimmed = false;
        while let Some(last) = self.alerts.back() {
            if now_ms.saturating_sub(last.alert_timestamp) > self.max_age_ms {
                self.alerts.pop_back();
                trimmed = true;
            } else {
                break;
            }
        }
        if trimmed {
            self.rebuild_index();
        }
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, alert) in self.alerts.iter().enumerate() {
            if !alert.alert_id.is_empty() {
                self.index.entry(alert.alert_id.clone()).or_insert(pos);
            }
        }
    }
}
