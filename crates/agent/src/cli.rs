use clap::Parser;

use infrastructure::config::{LogFormat, LogLevel};
use infrastructure::constants::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(
    name = "alertrelay-agent",
    version,
    about = "Server-side core of the alert-ingestion integration"
)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Override the configured log level (error, warn, info, debug, trace).
    #[arg(long, value_parser = parse_log_level)]
    pub log_level: Option<LogLevel>,

    /// Override the configured log format (json, text).
    #[arg(long, value_parser = parse_log_format)]
    pub log_format: Option<LogFormat>,
}

fn parse_log_level(raw: &str) -> Result<LogLevel, String> {
    match raw.to_lowercase().as_str() {
        "error" => Ok(LogLevel::Error),
        "warn" => Ok(LogLevel::Warn),
        "info" => Ok(LogLevel::Info),
        "debug" => Ok(LogLevel::Debug),
        "trace" => Ok(LogLevel::Trace),
        other => Err(format!("unknown log level '{other}'")),
    }
}

fn parse_log_format(raw: &str) -> Result<LogFormat, String> {
    match raw.to_lowercase().as_str() {
        "json" => Ok(LogFormat::Json),
        "text" => Ok(LogFormat::Text),
        other => Err(format!("unknown log format '{other}'")),
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
