//! Logging Configuration

use onething_core::util::logging::resolve_log_directive;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `log` records from the library crates
/// are forwarded through the subscriber's log bridge.
pub fn init_logging(is_debug: bool) {
    let default_level = if is_debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let directive = resolve_log_directive(default_level, |key| std::env::var(key).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Warning: Invalid log filter '{}': {}", directive, e);
        EnvFilter::new("info")
    });

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
    {
        eprintln!("Warning: Logging already initialized: {}", e);
    }
}
