use onething_core::util::logging::resolve_log_directive;
use tracing_subscriber::EnvFilter;

/// Log to stderr so streamed briefing text on stdout stays clean.
pub fn init_logging(is_debug: bool) {
    let default_level = if is_debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    let directive = resolve_log_directive(default_level, |key| std::env::var(key).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
