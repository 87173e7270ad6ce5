//! Shared error type, log settings and serde defaults for the config tree.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("validation error: {field}: {message}")]
    Validation { field: String, message: String },
}

impl From<serde_yaml_ng::Error> for ConfigError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        Self::Yaml(e.to_string())
    }
}

impl ConfigError {
    pub(super) fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ── Log settings ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

// ── Shared serde defaults ──────────────────────────────────────────

pub(super) fn default_log_level() -> LogLevel {
    LogLevel::Info
}

pub(super) fn default_log_format() -> LogFormat {
    LogFormat::Text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parses_lowercase() {
        let level: LogLevel = serde_yaml_ng::from_str("debug").unwrap();
        assert_eq!(level, LogLevel::Debug);
        assert_eq!(level.as_str(), "debug");
    }

    #[test]
    fn validation_error_names_the_field() {
        let err = ConfigError::validation("vendor.url", "must not be empty");
        assert!(err.to_string().contains("vendor.url"));
    }
}
