//! Logging setup.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Targets that are chatty at `info` and below.
const QUIET_TARGETS: &str = "sqlx=warn,hyper=warn";

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},{}", level, QUIET_TARGETS)))
}

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
///
/// Formats: `json` for production, `compact` for single-line local output,
/// anything else renders pretty multi-line events.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(env_filter(&config.level));

    match config.format.as_str() {
        "json" => registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_current_span(true),
            )
            .try_init(),
        "compact" => registry.with(fmt::layer().compact()).try_init(),
        _ => registry
            .with(fmt::layer().pretty().with_span_events(FmtSpan::CLOSE))
            .try_init(),
    }
}
