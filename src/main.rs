//! upstream-dispatch
//!
//! ```text
//!     Client Request
//!     ───────────────▶ axum server ──▶ Dispatcher ──┬─ exact path?  ─▶ handler
//!                      (trace, id,                  └─ longest prefix ─▶ handler
//!                       timeout)                                 │
//!                                           ┌────────────────────┼───────────────────┐
//!                                           ▼                    ▼                   ▼
//!                                     static response      file system        HTTP/HTTPS backend
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use upstream_dispatch::config::{load_config, watcher::ConfigWatcher, ProxyConfig};
use upstream_dispatch::observability::init_logging;
use upstream_dispatch::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "upstream-dispatch")]
#[command(about = "Route requests to static responses, files, or HTTP backends by path", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration and build the dispatcher, then exit.
    #[arg(long)]
    check: bool,

    /// Do not reload when the configuration file changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "upstream-dispatch starting");

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;
    tracing::info!(
        routes = server.handle().current().len(),
        request_timeout_secs = server.config().timeouts.request_secs,
        "Dispatcher built"
    );

    if cli.check {
        tracing::info!("Configuration OK");
        return Ok(());
    }

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match cli.config.as_deref().filter(|_| !cli.no_watch) {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
