//! `netwatch` — terminal dashboard for a LAN monitor server.
//!
//! Shows the latest probe result of every configured monitor and the
//! hosts discovered on each network, grouped into tabs and paged five at a
//! time. Data comes from the server's REST endpoints; a live update socket
//! feeds metric samples into the header.
//!
//! Logs are written to a file (default `/tmp/netwatch.log`) so they never
//! corrupt the terminal UI.

mod action;
mod app;
mod data_bridge;
mod event;
mod theme;
mod tui;
mod ui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use netwatch_config::Config;
use netwatch_core::Controller;

use crate::app::App;

/// Terminal dashboard for the netwatch LAN monitor.
#[derive(Parser, Debug)]
#[command(name = "netwatch", version, about)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "NETWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Monitor server URL (e.g., http://192.168.1.2:8000)
    #[arg(short, long)]
    server: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Start with periodic monitor refresh disabled
    #[arg(long)]
    no_auto_refresh: bool,

    /// Do not open the live update socket
    #[arg(long)]
    no_live: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Log file path (defaults to /tmp/netwatch.log)
    #[arg(long, default_value = "/tmp/netwatch.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may go to stdout/stderr while the TUI is up.
/// The returned guard must live as long as the app so logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Target prefix covers every netwatch_* crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("netwatch={log_level}")));

    let log_dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("netwatch.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Load the config file and layer CLI flags on top.
fn effective_config(cli: &Cli) -> Result<Config> {
    let mut cfg = match &cli.config {
        Some(path) => netwatch_config::load_config_from(path),
        None => netwatch_config::load_config(),
    }
    .wrap_err("failed to load configuration")?;

    if let Some(server) = &cli.server {
        cfg.server.clone_from(server);
    }
    if cli.insecure {
        cfg.insecure = true;
    }
    if cli.no_auto_refresh {
        cfg.auto_refresh = false;
    }
    if cli.no_live {
        cfg.live_updates = false;
    }

    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = effective_config(&cli)?;
    if cli.print_config {
        print!("{}", netwatch_config::to_toml(&cfg)?);
        return Ok(());
    }

    let dashboard = netwatch_config::to_dashboard_config(&cfg)?;

    // Hooks go in before the terminal switches to raw mode
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    info!(
        server = %dashboard.server,
        networks = dashboard.networks.len(),
        auto_refresh = dashboard.auto_refresh,
        live = dashboard.live_updates,
        "starting netwatch"
    );

    let controller = Controller::from_config(dashboard)?;
    let mut app = App::new(controller);
    app.run().await?;

    Ok(())
}
