//! YAML configuration for the integration process.
//!
//! Layout mirrors the deployment file:
//!
//! ```yaml
//! agent:
//!   bind_address: 127.0.0.1
//!   http_port: 8080
//!   log_level: info
//!   log_format: text
//! vendor:
//!   url: https://gateway.example.com
//!   client_id: "..."
//!   client_secret: "..."
//!   poll_interval_secs: 300
//!   lists_to_watch: ["12345"]
//! ```

mod cache;
mod common;
mod gateway;
mod vendor;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use cache::CacheConfig;
pub use common::{ConfigError, LogFormat, LogLevel};
pub use gateway::GatewayConfig;
pub use vendor::{IngestMode, VendorConfig, WatchEntry};

use crate::constants::DEFAULT_HTTP_PORT;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default = "common::default_log_level")]
    pub log_level: LogLevel,

    #[serde(default = "common::default_log_format")]
    pub log_format: LogFormat,

    /// Serve the Swagger UI for the inbound API.
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            http_port: default_http_port(),
            log_level: common::default_log_level(),
            log_format: common::default_log_format(),
            swagger_ui: false,
        }
    }
}

/// Root configuration. `vendor` is the only mandatory section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationConfig {
    #[serde(default)]
    pub agent: AgentSection,
    pub vendor: VendorConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl IntegrationConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate config from a YAML string.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.vendor.validate()?;
        self.gateway.validate()?;
        self.cache.validate()?;
        Ok(())
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
vendor:
  url: https://gateway.example.com
  client_id: cid
  client_secret: secret
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = IntegrationConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(cfg.agent.http_port, 8080);
        assert_eq!(cfg.agent.log_level, LogLevel::Info);
        assert_eq!(cfg.gateway.queue_size, 12);
        assert_eq!(cfg.cache.max_items, 100);
        assert_eq!(cfg.vendor.poll_interval_secs, 300);
        assert_eq!(cfg.vendor.mode, IngestMode::Cursor);
    }

    #[test]
    fn missing_vendor_section_fails_parse() {
        assert!(IntegrationConfig::from_yaml("agent:\n  http_port: 9000\n").is_err());
    }

    #[test]
    fn invalid_vendor_fails_validation() {
        let raw = r#"
vendor:
  url: gateway.example.com
  client_id: cid
  client_secret: secret
"#;
        let err = IntegrationConfig::from_yaml(raw).unwrap_err();
        assert!(err.to_string().contains("vendor.url"));
    }

    #[test]
    fn full_config_round_trips() {
        let raw = r#"
agent:
  bind_address: 0.0.0.0
  http_port: 9090
  log_level: debug
  log_format: json
  swagger_ui: true
vendor:
  url: https://gateway.example.com
  client_id: cid
  client_secret: secret
  poll_interval_secs: 60
  lists_to_watch: ["1", "2"]
  alert_types_to_watch: ["Flash"]
  timezone: America/New_York
gateway:
  max_retries: 5
cache:
  max_items: 50
  max_age_hours: 1
"#;
        let cfg = IntegrationConfig::from_yaml(raw).unwrap();
        assert_eq!(cfg.agent.http_port, 9090);
        assert_eq!(cfg.agent.log_format, LogFormat::Json);
        assert_eq!(cfg.gateway.max_retries, 5);
        assert_eq!(cfg.cache.max_age_ms(), 3_600_000);
        assert_eq!(cfg.vendor.watch_list_ids(), vec!["1", "2"]);
        assert_eq!(cfg.vendor.admission_filter().key(), "flash");
    }
}
