//! Logging infrastructure for AlertView.
//!
//! Structured logging through the `tracing` ecosystem. The dashboard owns the
//! terminal, so logs go to a daily-rolling JSON file and, when verbose, to
//! stderr as well.
//!
//! ## Example
//!
//! ```no_run
//! use alertview_core::logging;
//!
//! let _guard = logging::init_logging(None, false).expect("logging init");
//!
//! tracing::info!("AlertView started");
//! tracing::debug!(alert_id = 7, "mark-read acknowledged");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::error::{AlertViewError, Result};

/// Guard that must be held to ensure log flushing on shutdown.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the AlertView logging system.
///
/// Sets up:
/// - File logging to `~/.alertview/logs/alertview.log` (JSON lines, rolled daily)
/// - Console logging to stderr when `verbose` is set
///
/// # Arguments
///
/// * `log_dir` - Optional custom log directory. Defaults to `~/.alertview/logs/`
/// * `verbose` - If true, sets log level to DEBUG. Otherwise uses INFO.
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| AlertViewError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "alertview.log");
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("alertview={default_level}")));

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true);

    // Stderr shares the screen with the dashboard, so it stays quiet unless asked.
    let console_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .compact()
            .boxed()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| AlertViewError::internal(format!("logging already initialized: {e}")))?;

    tracing::debug!(log_dir = %log_dir.display(), verbose, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// Initialize minimal console-only logging for testing.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Get the AlertView home directory (`~/.alertview/`).
pub fn alertview_home() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| AlertViewError::Internal {
        message: "home directory could not be determined".into(),
    })?;

    Ok(home.join(".alertview"))
}

/// Get the default log directory path (`~/.alertview/logs/`).
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(alertview_home()?.join("logs"))
}
