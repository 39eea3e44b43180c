//! causerie-server - chat widget relay and analytics dashboard server

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use causerie_server::http::{build_router, AppState};
use causerie_core::Config;
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(name = "causerie-server", about = "Chat widget relay and analytics dashboard")]
struct Args {
    /// Bind host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Data directory holding transcripts and logs (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = args.data_dir {
        config.data.dir = Some(dir);
    }

    // Initialize logging (to file; stdout stays quiet for service managers)
    let _log_guard =
        causerie_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!(
        data_dir = %config.data_dir().display(),
        "causerie-server starting up"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::from_config(config));
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("causerie HTTP API listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("HTTP server shutting down...");
    })
    .await
    .context("server error")?;

    Ok(())
}
