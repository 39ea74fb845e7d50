//! Spreadsheet upload gateway.
//!
//! Sits in front of a document-management backend and forwards all traffic
//! unchanged, except multipart uploads carrying `.xlsx`/`.xls` files: those
//! files are converted to self-describing HTML by the normalizer service
//! before the upload is re-submitted to the backend.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                     GATEWAY                          │
//!                      │                                                      │
//!   Client Request     │  ┌─────────┐    ┌────────────┐                       │
//!   ───────────────────┼─▶│  http   │───▶│  routing   │                       │
//!                      │  │ server  │    │ classifier │                       │
//!                      │  └─────────┘    └─────┬──────┘                       │
//!                      │         ┌─────────────┼──────────────┐               │
//!                      │         ▼             ▼              ▼               │
//!                      │   ┌───────────┐ ┌───────────┐ ┌────────────┐         │
//!                      │   │ intercept │ │ download  │ │passthrough │         │
//!                      │   │orchestratr│ │  proxy    │ │   proxy    │         │
//!                      │   └─────┬─────┘ └─────┬─────┘ └─────┬──────┘         │
//!                      │         │ multipart   │             │                │
//!                      │         │ decode/     │             │                │
//!                      │         │ encode      │             │                │
//!                      └─────────┼─────────────┼─────────────┼────────────────┘
//!                                ▼             ▼             ▼
//!                         sheet-normalizer  normalizer     Backend
//!                         POST /process       host
//! ```

use std::path::PathBuf;

use clap::Parser;

use sheet_gateway::config::load_config;
use sheet_gateway::http::GatewayServer;
use sheet_gateway::lifecycle::{signals, startup, Shutdown};

#[derive(Parser)]
#[command(name = "sheet-gateway")]
#[command(about = "Reverse proxy that converts uploaded spreadsheets before they reach the backend", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sheet-gateway: {}", e);
            std::process::exit(1);
        }
    };

    startup::init_observability(&config.observability);
    tracing::info!("sheet-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend_url = config.upstream.backend_url.as_deref().unwrap_or_default(),
        normalizer_url = config.upstream.normalizer_url.as_deref().unwrap_or("<none>"),
        upload_paths = ?config.routes.upload_paths,
        "Configuration loaded"
    );

    let server = GatewayServer::new(&config)?;
    let listener = startup::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());
    server.run(listener, shutdown.wait()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
