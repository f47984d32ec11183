//! CLI flags and account configuration.
//!
//! Flags are parsed with clap; the account credentials come from a JSON
//! config file (`{"accountNumber": ..., "username": ..., "password": ...}`)
//! loaded once at startup. Any missing or empty field is fatal before the
//! metrics listener starts.

use crate::error::ConfigError;
use clap::Parser;
use serde_derive::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Shortest update interval we accept; anything below this hammers the
/// provider API for no benefit.
const MIN_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "ovo-energy-exporter", version)]
#[command(
    about = "Continuously fetches the latest gas and electricity readings from \
             OVO energy and exposes them as Prometheus gauges on :8080/metrics"
)]
pub struct Cli {
    /// Show debug logs
    #[arg(long)]
    pub debug: bool,

    /// Json account config file
    #[arg(long, default_value = "/config.json")]
    pub config: PathBuf,

    /// Interval between OVO scans (e.g. 30s, 30m, 1h; minimum 10s)
    #[arg(long, default_value = "30m")]
    pub interval: String,
}

impl Cli {
    pub fn log_level(&self) -> tracing::Level {
        if self.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Parses the interval flag and enforces the 10-second minimum.
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        let interval = parse_duration(&self.interval)?;
        if interval < MIN_INTERVAL {
            return Err(ConfigError::IntervalTooShort);
        }
        Ok(interval)
    }
}

/// Parses a duration string like "30s", "30m" or "1h". A bare number is
/// taken as seconds.
fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();

    let (numeric, multiplier) = if let Some(rest) = s.strip_suffix('s') {
        (rest, 1u64)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, 60)
    } else if let Some(rest) = s.strip_suffix('h') {
        (rest, 3600)
    } else {
        (s, 1)
    };

    let value: u64 = numeric
        .parse()
        .map_err(|_| ConfigError::InvalidInterval(s.to_string()))?;
    let seconds = value
        .checked_mul(multiplier)
        .ok_or_else(|| ConfigError::InvalidInterval(s.to_string()))?;

    Ok(Duration::from_secs(seconds))
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    pub account_number: String,
    pub username: String,
    pub password: String,
}

/// Loads and validates the account config file. Every field must be present
/// and non-empty before any scan starts.
pub fn load_account_config(path: &std::path::Path) -> Result<AccountConfig, ConfigError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io(&display, e))?;
    let config: AccountConfig =
        serde_json::from_str(&raw).map_err(|e| ConfigError::json(&display, e))?;

    if config.account_number.is_empty() {
        return Err(ConfigError::MissingField("accountNumber"));
    }
    if config.username.is_empty() {
        return Err(ConfigError::MissingField("username"));
    }
    if config.password.is_empty() {
        return Err(ConfigError::MissingField("password"));
    }
    Ok(config)
}
