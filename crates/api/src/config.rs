//! Runtime configuration, read once from the environment at startup.
//!
//! Every setting has a default. A value that is present but unparsable is
//! logged and replaced by the default rather than aborting startup.

use std::net::SocketAddr;

use thiserror::Error;
use tracing::warn;

use stockwatch_inventory::DEFAULT_WINDOW_DAYS;

pub const ENV_BIND_ADDR: &str = "STOCKWATCH_BIND_ADDR";
pub const ENV_FORECAST_WINDOW_DAYS: &str = "STOCKWATCH_FORECAST_WINDOW_DAYS";
pub const ENV_DEFAULT_THRESHOLD: &str = "STOCKWATCH_DEFAULT_THRESHOLD";
pub const ENV_ALERT_RECIPIENTS: &str = "STOCKWATCH_ALERT_RECIPIENTS";
pub const ENV_MATERIAL_CATALOG: &str = "STOCKWATCH_MATERIAL_CATALOG";

const DEFAULT_THRESHOLD: f64 = 10.0;
/// Largest accepted forecast window (about a century).
pub const MAX_WINDOW_DAYS: i64 = 36_500;
const DEFAULT_CATALOG: &str = "Cement,Steel,Sand,Gravel,Bricks,Other";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key}: cannot parse {value:?}: {reason}")]
    Parse {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{key}: {reason}")]
    OutOfRange { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Trailing window for consumption-rate forecasts, in whole days.
    pub forecast_window_days: i64,
    /// Threshold applied when a delivery does not specify one.
    pub default_threshold: f64,
    /// Who receives low-stock notifications.
    pub alert_recipients: Vec<String>,
    /// Preset material names offered to clients.
    pub material_catalog: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            forecast_window_days: DEFAULT_WINDOW_DAYS,
            default_threshold: DEFAULT_THRESHOLD,
            alert_recipients: Vec::new(),
            material_catalog: split_list(DEFAULT_CATALOG),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment, or a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_addr = setting(&lookup, ENV_BIND_ADDR, defaults.bind_addr, |raw| {
            raw.parse::<SocketAddr>().map_err(|e| parse_error(ENV_BIND_ADDR, raw, e))
        });

        let forecast_window_days = setting(
            &lookup,
            ENV_FORECAST_WINDOW_DAYS,
            defaults.forecast_window_days,
            |raw| {
                let days = raw
                    .parse::<i64>()
                    .map_err(|e| parse_error(ENV_FORECAST_WINDOW_DAYS, raw, e))?;
                if !(1..=MAX_WINDOW_DAYS).contains(&days) {
                    return Err(ConfigError::OutOfRange {
                        key: ENV_FORECAST_WINDOW_DAYS,
                        reason: format!("must be between 1 and {MAX_WINDOW_DAYS} days (got {days})"),
                    });
                }
                Ok(days)
            },
        );

        let default_threshold = setting(
            &lookup,
            ENV_DEFAULT_THRESHOLD,
            defaults.default_threshold,
            |raw| {
                let value = raw
                    .parse::<f64>()
                    .map_err(|e| parse_error(ENV_DEFAULT_THRESHOLD, raw, e))?;
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::OutOfRange {
                        key: ENV_DEFAULT_THRESHOLD,
                        reason: format!("must be a finite number >= 0 (got {value})"),
                    });
                }
                Ok(value)
            },
        );

        let alert_recipients = lookup(ENV_ALERT_RECIPIENTS)
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.alert_recipients);

        let material_catalog = lookup(ENV_MATERIAL_CATALOG)
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.material_catalog);

        Self {
            bind_addr,
            forecast_window_days,
            default_threshold,
            alert_recipients,
            material_catalog,
        }
    }

    pub fn forecast_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.forecast_window_days)
    }
}

fn setting<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
    parse: impl FnOnce(&str) -> Result<T, ConfigError>,
) -> T {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match parse(raw.trim()) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "invalid configuration value; using default");
            default
        }
    }
}

fn parse_error(key: &'static str, raw: &str, err: impl core::fmt::Display) -> ConfigError {
    ConfigError::Parse {
        key,
        value: raw.to_string(),
        reason: err.to_string(),
    }
}

/// Comma-separated list; entries are trimmed and blanks dropped.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
