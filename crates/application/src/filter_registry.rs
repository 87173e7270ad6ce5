use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use domain::alert::filter::TypeFilter;

/// Memoizing type-filter factory.
///
/// Keyed by the filter's stable key (lowercased names, sorted, joined), so
/// two requests whose type-sets are equal under case-insensitive set
/// equality share one predicate instance.
#[derive(Default)]
pub struct FilterRegistry {
    inner: Mutex<HashMap<String, Arc<TypeFilter>>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create<I, S>(&self, names: I) -> Arc<TypeFilter>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let filter = TypeFilter::new(names);
        let key = filter.key();
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(key).or_insert_with(|| Arc::new(filter)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_sets_share_one_instance() {
        let registry = FilterRegistry::new();
        let a = registry.get_or_create(["Flash", "urgent"]);
        let b = registry.get_or_create(["URGENT", "flash", "Urgent"]);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_sets_get_distinct_instances() {
        let registry = FilterRegistry::new();
        let a = registry.get_or_create(["flash"]);
        let b = registry.get_or_create(["urgent"]);
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
