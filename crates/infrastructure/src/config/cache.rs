//! Alert-cache bounds.

use serde::{Deserialize, Serialize};

use super::common::ConfigError;
use crate::constants::{CACHE_MAX_AGE_HOURS, CACHE_MAX_ITEMS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Alerts older than this never enter the cache and age out of reads.
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            max_age_hours: default_max_age_hours(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_items == 0 {
            return Err(ConfigError::validation(
                "cache.max_items",
                "must be greater than 0",
            ));
        }
        if self.max_age_hours == 0 {
            return Err(ConfigError::validation(
                "cache.max_age_hours",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    pub fn max_age_ms(&self) -> i64 {
        i64::try_from(self.max_age_hours).unwrap_or(i64::MAX / 3_600_000) * 3_600_000
    }
}

fn default_max_items() -> usize {
    CACHE_MAX_ITEMS
}
fn default_max_age_hours() -> u64 {
    CACHE_MAX_AGE_HOURS
}
