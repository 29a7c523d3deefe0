//! HA Bridge Daemon - Main entry point
//!
//! Serves the device management REST API and polls the configured hubs.

mod api;
mod config;
mod error;
mod server;
mod state;
mod vera_poll;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "habridge")]
#[command(about = "Home automation bridge device management daemon")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "habridge.toml")]
    config: PathBuf,

    /// Bind address for web server
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("HA Bridge v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_config(&args.config)?;

    if let Some(bind) = args.bind {
        config.daemon.bind = bind;
    }

    info!(
        db = %config.devices.db_path,
        vera = ?config.vera.address,
        harmony_hubs = config.harmony.as_ref().map_or(0, |h| h.hubs.len()),
        "Configuration loaded"
    );

    let state = state::AppState::new(config.clone())?;

    server::run(state, &config.daemon.bind, config.daemon.tls.as_ref()).await
}
