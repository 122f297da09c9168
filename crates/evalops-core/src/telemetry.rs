//! Tracing initialisation for evalops binaries.
//!
//! Call [`init_tracing`] once at program start. Respects the `EVALOPS_LOG`
//! environment variable for fine-grained filtering; falls back to the
//! supplied level otherwise. Safe to call more than once; only the first
//! call takes effect.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable controlling the log filter.
pub const LOG_ENV: &str = "EVALOPS_LOG";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable console output.
    Text,
    /// Newline-delimited JSON, for log aggregation pipelines.
    Json,
}

/// Initialise the global tracing subscriber.
pub fn init_tracing(format: LogFormat, default_level: Level) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str()));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false).json())
                .try_init()
                .ok();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false))
                .try_init()
                .ok();
        }
    }
}
