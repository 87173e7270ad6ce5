//! Vendor connection & watch configuration and conversion to domain types.

use serde::{Deserialize, Serialize};

use domain::alert::filter::TypeFilter;

use super::common::ConfigError;
use crate::constants::{DEFAULT_ALERT_TYPES_TO_WATCH, DEFAULT_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS};

/// Feed ingestion mode: token/cursor pagination or the signed bulk download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    #[default]
    Cursor,
    Bulk,
}

/// A watched list or alert-type entry. The host UI sends either plain
/// strings or `{value, display}` records; both normalize to the `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WatchEntry {
    Plain(String),
    Selection {
        value: serde_json::Value,
        #[serde(default)]
        display: Option<String>,
    },
}

impl WatchEntry {
    /// The normalized value; `None` for empty or `0` entries, which the UI
    /// uses as placeholders.
    fn normalized(&self) -> Option<String> {
        let raw = match self {
            Self::Plain(s) => s.trim().to_string(),
            Self::Selection { value, .. } => match value {
                serde_json::Value::String(s) => s.trim().to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => String::new(),
            },
        };
        if raw.is_empty() || raw == "0" {
            None
        } else {
            Some(raw)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Vendor base URL, without a trailing slash.
    pub url: String,
    pub client_id: String,
    pub client_secret: String,

    /// Alerts-poll period in seconds. Floor: 30.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Subscription lists to restrict alert queries to.
    #[serde(default)]
    pub lists_to_watch: Vec<WatchEntry>,

    /// Alert types admitted into the cache. Absent means the built-in
    /// default set; present entries are normalized and lowercased.
    #[serde(default)]
    pub alert_types_to_watch: Option<Vec<WatchEntry>>,

    /// IANA timezone hint for rendered timestamps.
    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(default)]
    pub mode: IngestMode,

    /// Signed bulk-download endpoint; required in `bulk` mode.
    #[serde(default)]
    pub download_url: Option<String>,
}

impl VendorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation("vendor.url", "must not be empty"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::validation(
                "vendor.url",
                format!("must use http:// or https:// scheme, got '{}'", self.url),
            ));
        }
        if self.url.ends_with('/') {
            return Err(ConfigError::validation(
                "vendor.url",
                "must not end with a trailing '/'",
            ));
        }
        if self.client_id.is_empty() {
            return Err(ConfigError::validation(
                "vendor.client_id",
                "must not be empty",
            ));
        }
        if self.client_secret.is_empty() {
            return Err(ConfigError::validation(
                "vendor.client_secret",
                "must not be empty",
            ));
        }
        if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
            return Err(ConfigError::validation(
                "vendor.poll_interval_secs",
                format!("must be at least {MIN_POLL_INTERVAL_SECS}"),
            ));
        }
        if self.mode == IngestMode::Bulk && self.download_url.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::validation(
                "vendor.download_url",
                "required when mode is 'bulk'",
            ));
        }
        Ok(())
    }

    /// Normalized list ids. Empty means no list restriction.
    pub fn watch_list_ids(&self) -> Vec<String> {
        self.lists_to_watch
            .iter()
            .filter_map(WatchEntry::normalized)
            .collect()
    }

    /// Watched type names: configured entries when present, the built-in
    /// default set when absent. Entries that normalize away are dropped, so
    /// a list of placeholders means "watch everything".
    pub fn watch_type_names(&self) -> Vec<String> {
        match &self.alert_types_to_watch {
            None => DEFAULT_ALERT_TYPES_TO_WATCH
                .iter()
                .map(ToString::to_string)
                .collect(),
            Some(entries) => entries.iter().filter_map(WatchEntry::normalized).collect(),
        }
    }

    /// The admission filter over [`watch_type_names`](Self::watch_type_names).
    pub fn admission_filter(&self) -> TypeFilter {
        TypeFilter::new(self.watch_type_names())
    }
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> VendorConfig {
        VendorConfig {
            url: "https://gateway.example.com".to_string(),
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            poll_interval_secs: 300,
            lists_to_watch: Vec::new(),
            alert_types_to_watch: None,
            timezone: None,
            mode: IngestMode::Cursor,
            download_url: None,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn trailing_slash_is_rejected() {
        let mut cfg = base();
        cfg.url.push('/');
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("vendor.url"));
    }

    #[test]
    fn poll_interval_floor_enforced() {
        let mut cfg = base();
        cfg.poll_interval_secs = 29;
        assert!(cfg.validate().is_err());
        cfg.poll_interval_secs = 30;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn bulk_mode_requires_download_url() {
        let mut cfg = base();
        cfg.mode = IngestMode::Bulk;
        assert!(cfg.validate().is_err());
        cfg.download_url = Some("https://download.example.com/feed".to_string());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn watch_entries_normalize_strings_and_selections() {
        let yaml = r#"
url: https://gateway.example.com
client_id: cid
client_secret: secret
lists_to_watch:
  - "12345"
  - value: 678
    display: Energy
  - value: ""
  - "0"
"#;
        let cfg: VendorConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(cfg.watch_list_ids(), vec!["12345", "678"]);
    }

    #[test]
    fn absent_types_use_default_set() {
        let filter = base().admission_filter();
        assert_eq!(filter.key(), "flash,urgent");
    }

    #[test]
    fn configured_types_override_default() {
        let mut cfg = base();
        cfg.alert_types_to_watch = Some(vec![WatchEntry::Plain("Alert".to_string())]);
        assert_eq!(cfg.admission_filter().key(), "alert");
    }

    #[test]
    fn all_placeholder_types_admit_everything() {
        let mut cfg = base();
        cfg.alert_types_to_watch = Some(vec![WatchEntry::Plain("0".to_string())]);
        assert!(cfg.admission_filter().is_empty());
    }
}
