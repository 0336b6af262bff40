//! Log level resolution shared by the binaries
//!
//! Library code logs through the `log` facade; each binary turns the
//! directive resolved here into its subscriber filter.

pub const LOG_LEVEL_ENV: &str = "ONETHING_LOG_LEVEL";
pub const RUST_LOG_ENV: &str = "RUST_LOG";

pub fn parse_log_level(value: &str) -> Option<log::LevelFilter> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Some(log::LevelFilter::Trace),
        "debug" => Some(log::LevelFilter::Debug),
        "info" => Some(log::LevelFilter::Info),
        "warn" => Some(log::LevelFilter::Warn),
        "error" => Some(log::LevelFilter::Error),
        "off" => Some(log::LevelFilter::Off),
        _ => None,
    }
}

pub fn level_to_str(level: log::LevelFilter) -> &'static str {
    match level {
        log::LevelFilter::Trace => "trace",
        log::LevelFilter::Debug => "debug",
        log::LevelFilter::Info => "info",
        log::LevelFilter::Warn => "warn",
        log::LevelFilter::Error => "error",
        log::LevelFilter::Off => "off",
    }
}

/// Filter directive for the subscriber: `ONETHING_LOG_LEVEL`, then
/// `RUST_LOG`, then `default_level`.
pub fn resolve_log_directive<F>(default_level: log::LevelFilter, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(LOG_LEVEL_ENV) {
        match parse_log_level(&value) {
            Some(level) => return level_to_str(level).to_string(),
            None => eprintln!(
                "Warning: Invalid {} '{}', falling back to default",
                LOG_LEVEL_ENV, value
            ),
        }
    }

    if let Some(directive) = lookup(RUST_LOG_ENV).filter(|d| !d.trim().is_empty()) {
        return directive;
    }

    level_to_str(default_level).to_string()
}
