//! Telemetry and Observability
//!
//! Handles setting up `tracing-subscriber` for structured logging.
//! Supports config-driven log levels, environment variable overrides,
//! and format switching between pretty (debug) and JSON (release).
//!
//! Logs go to stderr; stdout belongs to the conversation.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber with the given log level from config.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter > default "info"
///
/// In debug builds: pretty-printed output.
/// In release builds: JSON structured output with the current turn span.
///
/// Only the first call installs a subscriber; later calls are no-ops.
pub fn init_telemetry_with_level(log_level: &str) {
    let default_filter = format!("{},sahayak_engine={}", log_level, log_level);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    }
}

/// Initialize the tracing subscriber at "warn".
///
/// Used before the config is loaded so failures while loading still get
/// logged without flooding the console.
pub fn init_telemetry() {
    init_telemetry_with_level("warn");
}
