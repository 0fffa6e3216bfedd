//! Tracing setup for the sigcheck binary.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "sigcheck=info";

pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Daily log files go here when set
    pub log_dir: Option<PathBuf>,
}

/// Install the global subscriber.
///
/// Stderr only shows warnings unless `verbose` is set, so the terminal
/// report stays readable. `RUST_LOG` overrides the default filter. The
/// returned guard flushes the file writer and must be held until exit.
pub fn init_logging(config: LogConfig<'_>) -> Result<Option<WorkerGuard>> {
    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    } else {
        EnvFilter::new("warn")
    };

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let Some(log_dir) = config.log_dir else {
        tracing_subscriber::registry()
            .with(console)
            .try_init()
            .context("Failed to install tracing subscriber")?;
        return Ok(None);
    };

    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::daily(&log_dir, format!("{}.log", config.app_name));
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(console)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(Some(guard))
}
