use std::collections::BTreeSet;

use super::entity::Alert;

/// Type-based admission predicate.
///
/// Holds a lowercased set of alert-type names. An empty set admits every
/// alert; a non-empty set admits only alerts whose `alertType.name` is in
/// the set (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFilter {
    types: BTreeSet<String>,
}

impl TypeFilter {
    /// Build a filter from raw type names. Names are lowercased and
    /// deduplicated; empty names are dropped.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let types = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        Self { types }
    }

    /// A filter that admits everything.
    pub fn admit_all() -> Self {
        Self {
            types: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Whether the alert passes the type predicate.
    pub fn matches(&self, alert: &Alert) -> bool {
        self.types.is_empty() || self.types.contains(&alert.type_name_lower())
    }

    /// Stable identity key: the lowercased names, sorted and joined.
    ///
    /// Two filters built from type-sets that are equal under case-insensitive
    /// set equality produce the same key, which the factory uses to hand out
    /// a shared predicate instance.
    pub fn key(&self) -> String {
        let names: Vec<&str> = self.types.iter().map(String::as_str).collect();
        names.join(",")
    }
}
