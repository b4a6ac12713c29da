//! server-bootstrap
//!
//! Serves the standard middleware chain and `/healthcheck`.
//!
//! ```text
//! config file + NODE_ENV
//!     → Settings, Mode
//!     → ServerConfigurator::configure(ServerInstance)
//!         cookies → bodies → compression → security headers
//!         → no-cache → CSP → /healthcheck → (dev) source watcher
//!     → HttpServer::run until SIGINT/SIGTERM or, in development, the first
//!       source change (exit for the supervisor to restart)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use server_bootstrap::config::{load_settings, Mode};
use server_bootstrap::lifecycle::{spawn_signal_listener, Shutdown};
use server_bootstrap::observability::{init_logging, metrics};
use server_bootstrap::reload::{spawn_restart_on_change, ReloadEvent};
use server_bootstrap::{HttpServer, ServerConfigurator, ServerInstance};

#[derive(Parser)]
#[command(name = "server-bootstrap")]
#[command(about = "Web server with the standard middleware chain", long_about = None)]
struct Cli {
    /// Path to the TOML settings file.
    #[arg(short, long, default_value = "config/default.toml")]
    config: PathBuf,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mode = Mode::from_env();

    let mut settings = load_settings(&cli.config)?;
    if let Some(bind) = cli.bind {
        settings.listener.bind_address = bind;
    }

    init_logging(mode, &settings.observability.log_level);
    tracing::info!(
        mode = %mode,
        config = ?cli.config,
        bind_address = %settings.listener.bind_address,
        "server-bootstrap v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = settings.listener.bind_address.clone();
    let (reload_tx, reload_rx) = mpsc::unbounded_channel::<ReloadEvent>();
    let mut configurator =
        ServerConfigurator::new(mode, settings).with_coordinator(Arc::new(reload_tx));

    let mut server = ServerInstance::new();
    configurator.configure(&mut server).await?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());
    if configurator.watcher().is_some() {
        spawn_restart_on_change(reload_rx, shutdown.clone());
    }

    HttpServer::new(server.into_router())
        .run(listener, shutdown.subscribe())
        .await?;

    // The source watcher stops with the configurator.
    drop(configurator);
    tracing::info!("Shutdown complete");
    Ok(())
}
