//! Logging initialization.
//!
//! `logging.format` selects the output: "json" for deployments behind a
//! log collector, anything else for a human-readable form during
//! development. `RUST_LOG` overrides the configured level.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Initializes the logging subsystem based on configuration.
pub fn init_logging(config: &LoggingConfig) {
    // sqlx logs every statement at its configured level; keep it at
    // warn unless RUST_LOG asks for more.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},sqlx=warn", config.level)));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.format == "json" {
        registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_current_span(true),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_span_events(FmtSpan::CLOSE))
            .init();
    }
}
