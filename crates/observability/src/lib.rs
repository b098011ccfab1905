//! Process-wide tracing/logging setup.

/// Selects the log formatter; `json` unless `STOCKWATCH_LOG_FORMAT=pretty`.
pub const ENV_LOG_FORMAT: &str = "STOCKWATCH_LOG_FORMAT";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    /// Unknown or missing values fall back to JSON.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("pretty") | Some("compact") | Some("text") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Initialize process-wide observability.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize with human-readable (non-JSON) output, for local runs.
pub fn init_pretty() {
    tracing::init_pretty();
}

/// Initialize with the format named by `STOCKWATCH_LOG_FORMAT`.
pub fn init_from_env() {
    let setting = std::env::var(ENV_LOG_FORMAT).ok();
    match LogFormat::from_setting(setting.as_deref()) {
        LogFormat::Json => init(),
        LogFormat::Pretty => init_pretty(),
    }
}

/// Subscriber configuration (filters, formatters).
pub mod tracing;
