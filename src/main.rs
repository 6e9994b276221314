//! AlertView - terminal dashboard for device alerts
//!
//! Shows the alerts held by a remote alert store, keeps the unread badges in
//! step with the server and lets the user mark alerts read.
//!
//! ## Usage
//!
//! ```bash
//! # Connect to the configured server (~/.alertview/config.yaml)
//! alertview
//!
//! # Point at another server, polling every 30 seconds
//! alertview --base-url https://sensors.example.com --interval 30
//!
//! # Offline demo with built-in sample alerts
//! alertview --demo
//!
//! # With verbose logging
//! alertview -v --log-dir /path/to/logs/
//! ```

use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use alertview_client::{AlertTransport, HttpTransport, MockTransport, token_source_from_config};
use alertview_core::{Alert, AlertViewConfig, LogGuard, Severity, init_logging};
use alertview_tui::App;
use chrono::{Duration, Utc};
use clap::Parser;
use tracing::{error, info};

/// AlertView alert dashboard
///
/// A terminal interface for reading and acknowledging device alerts.
#[derive(Parser, Debug)]
#[command(name = "alertview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.alertview/logs/)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Configuration file (defaults to ~/.alertview/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Alert server base URL, overriding config and environment
    #[arg(long)]
    base_url: Option<String>,

    /// Poll interval in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Use built-in sample alerts instead of a server
    #[arg(long)]
    demo: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(1);
        }
    };

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("configuration error: {}", e);
            eprintln!("Error: {}", e);
            if let Some(hint) = e.guidance() {
                eprintln!("Hint: {}", hint);
            }
            return ExitCode::from(if e.is_config_error() { 2 } else { 1 });
        }
    };

    // Install panic hook to ensure terminal cleanup
    install_panic_hook();

    info!(base_url = %config.server.base_url, demo = cli.demo, "Starting AlertView");

    match run_app(config, cli.demo) {
        Ok(()) => {
            info!("AlertView exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("AlertView error: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Install a panic hook that restores the terminal before printing the panic message.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Restore terminal to its normal state.
fn restore_terminal() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();

    let _ = crossterm::terminal::disable_raw_mode();
    crossterm::execute!(
        stdout,
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    stdout.flush()?;

    Ok(())
}

/// Set up logging based on CLI arguments.
fn setup_logging(cli: &Cli) -> alertview_core::Result<LogGuard> {
    init_logging(cli.log_dir.clone(), cli.verbose > 0)
}

/// Resolve configuration: file, then environment, then CLI flags.
fn load_config(cli: &Cli) -> alertview_core::Result<AlertViewConfig> {
    let mut config = match &cli.config {
        Some(path) => AlertViewConfig::load(path)?,
        None => AlertViewConfig::load_or_default()?,
    };
    config.apply_env_overrides();
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(secs) = cli.interval {
        config = config.with_poll_interval(secs);
    }
    config.validate()?;
    Ok(config)
}

/// Run the TUI application.
fn run_app(config: AlertViewConfig, demo: bool) -> alertview_tui::AppResult<()> {
    let transport: Arc<dyn AlertTransport> = if demo {
        Arc::new(MockTransport::with_alerts(demo_alerts()))
    } else {
        let tokens = token_source_from_config(&config.server);
        Arc::new(HttpTransport::from_config(&config.server, tokens)?)
    };

    let mut app = App::new(config, transport)?;
    app.run()
}

/// Sample alerts for `--demo`, newest first.
fn demo_alerts() -> Vec<Alert> {
    let now = Utc::now();
    vec![
        Alert::new(6, "Temperature high", Severity::High, now - Duration::minutes(4))
            .with_device("greenhouse-1", Some("esp-07".to_string()))
            .with_message("Greenhouse temperature reached 41.2C (threshold 38C)"),
        Alert::new(5, "Humidity low", Severity::Medium, now - Duration::minutes(37))
            .with_device("greenhouse-1", Some("esp-07".to_string()))
            .with_message("Relative humidity dropped to 22%"),
        Alert::new(4, "Battery low", Severity::Low, now - Duration::hours(3))
            .with_device("field-probe-3", Some("esp-12".to_string()))
            .with_message("Battery at 9%"),
        Alert::new(3, "Firmware check skipped", Severity::Unknown, now - Duration::hours(20))
            .with_message("Device did not report a firmware version"),
        Alert::new(2, "Device offline", Severity::High, now - Duration::days(1))
            .with_device("field-probe-3", Some("esp-12".to_string()))
            .with_message("No data received for 10 minutes")
            .with_read(true),
        Alert::new(1, "Soil moisture low", Severity::Medium, now - Duration::days(2))
            .with_device("bed-a", None)
            .with_message("Soil moisture below 15%")
            .with_read(true),
    ]
}
