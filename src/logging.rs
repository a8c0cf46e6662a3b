use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Where and how to log.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Directory for daily-rotated log files; console only when `None`
    pub log_dir: Option<Utf8PathBuf>,

    /// Prefix for log file names (e.g., "wezconf")
    pub log_prefix: String,

    /// Use debug level instead of info
    pub debug: bool,

    /// Write JSON lines to the log file instead of plain text
    pub json_file: bool,
}

/// Install the global tracing subscriber.
///
/// Console output goes to stderr so stdout stays clean for reports. When a log
/// directory is given, a non-blocking daily-rotating file layer is added as well.
///
/// # Returns
/// The file appender guard, if any. Hold it for the life of the program so
/// buffered lines are flushed.
pub fn setup_logging(options: &LogOptions) -> Result<Option<WorkerGuard>> {
    let env_filter = if options.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let mut guard = None;
    let mut file_layer: Option<Box<dyn Layer<Registry> + Send + Sync>> = None;

    if let Some(log_dir) = &options.log_dir {
        ensure_log_dir(log_dir)?;

        let file_appender = rolling::daily(log_dir, &options.log_prefix);
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        file_layer = Some(if options.json_file {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false) // No ANSI codes in log files
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .boxed()
        });
    }

    tracing_subscriber::registry()
        .with(file_layer)
        .with(env_filter)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        "Logging initialized: dir={:?}, prefix={}, debug={}",
        options.log_dir,
        options.log_prefix,
        options.debug
    );

    Ok(guard)
}

/// Create the log directory if it doesn't exist
pub fn ensure_log_dir(log_dir: &Utf8Path) -> Result<()> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }
    Ok(())
}
