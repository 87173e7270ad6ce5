#![forbid(unsafe_code)]

pub mod cache_service;
pub mod dispatch_service;
pub mod filter_registry;
pub mod lookup_service;
pub mod parallel;
pub mod polling_service;
pub mod wire;

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
