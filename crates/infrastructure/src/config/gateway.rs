//! Gateway tuning knobs and conversion to `GatewaySettings`.

use serde::{Deserialize, Serialize};

use domain::vendor::entity::GatewaySettings;

use super::common::ConfigError;
use super::vendor::VendorConfig;
use crate::constants::{
    DEFAULT_MAX_RETRIES, DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW, DEFAULT_REQUEST_TIMEOUT,
    MAX_QUEUE_SIZE, QUEUE_REQUEST_TIMEOUT,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Retries for 429 responses, after the initial attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// FIFO queue capacity.
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    /// A request still queued past this many seconds is dropped.
    #[serde(default = "default_queue_timeout_secs")]
    pub queue_timeout_secs: u64,

    /// Per-attempt HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            queue_size: default_queue_size(),
            queue_timeout_secs: default_queue_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_size == 0 {
            return Err(ConfigError::validation(
                "gateway.queue_size",
                "must be greater than 0",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "gateway.request_timeout_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Combine with the vendor connection details into the settings the
    /// gateway adapter consumes.
    pub fn to_settings(&self, vendor: &VendorConfig) -> GatewaySettings {
        GatewaySettings {
            base_url: vendor.url.clone(),
            client_id: vendor.client_id.clone(),
            client_secret: vendor.client_secret.clone(),
            max_retries: self.max_retries,
            queue_size: self.queue_size,
            queue_timeout_ms: i64::try_from(self.queue_timeout_secs).unwrap_or(i64::MAX) * 1_000,
            request_timeout_ms: self.request_timeout_secs * 1_000,
            default_rate_limit: DEFAULT_RATE_LIMIT,
            default_rate_window_ms: i64::try_from(DEFAULT_RATE_WINDOW.as_millis())
                .unwrap_or(60_000),
        }
    }
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_queue_size() -> usize {
    MAX_QUEUE_SIZE
}
fn default_queue_timeout_secs() -> u64 {
    QUEUE_REQUEST_TIMEOUT.as_secs()
}
fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}
