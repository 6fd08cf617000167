//! Logging setup.

use tracing_subscriber::{fmt, prelude::*, util::TryInitError, EnvFilter};

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Filter from `RUST_LOG`, falling back to `level` for the whole process.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Logs go to stderr so reports printed on stdout stay machine-readable.
/// Fails if a subscriber is already installed.
pub fn setup_logging(level: &str, format: LogFormat) -> Result<(), TryInitError> {
    let filter = build_filter(level);

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    }
}
