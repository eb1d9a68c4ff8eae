//! Tracing subscriber setup for the CLI.
//!
//! Diagnostics go to stderr so they never mix with command output. `RUST_LOG`
//! wins over the level chosen from flags.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default level when neither `RUST_LOG` nor `--verbose` is given.
pub(crate) const DEFAULT_LOG_LEVEL: &str = "warn";
/// Level used with `--verbose`.
pub(crate) const VERBOSE_LOG_LEVEL: &str = "debug";
/// Environment variable selecting the log format.
pub(crate) const LOG_FORMAT_ENV: &str = "MICTL_LOG_FORMAT";

/// Logging configuration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LoggingConfig<'a> {
    pub(crate) level: &'a str,
    pub(crate) format: LogFormat,
}

impl LoggingConfig<'_> {
    /// Level from the verbose flag, format from `MICTL_LOG_FORMAT`.
    pub(crate) fn from_flags(verbose: bool) -> Self {
        let format = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .map_or(LogFormat::Pretty, |value| LogFormat::parse(&value));
        Self {
            level: if verbose {
                VERBOSE_LOG_LEVEL
            } else {
                DEFAULT_LOG_LEVEL
            },
            format,
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable logs.
    Pretty,
}

impl LogFormat {
    pub(crate) fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub(crate) fn init_logging(config: &LoggingConfig<'_>) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level));

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .without_time(),
            )
            .try_init(),
    }
    .map_err(|err| anyhow!(err))
}
