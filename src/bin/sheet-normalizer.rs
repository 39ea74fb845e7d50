//! Spreadsheet normalizer service.
//!
//! Serves `POST /process` and `GET /health` for the gateway. Shares the
//! gateway's configuration file; only the `normalizer`, `limits`,
//! `timeouts` and `observability` sections apply.

use std::path::PathBuf;

use clap::Parser;

use sheet_gateway::config::load_normalizer_config;
use sheet_gateway::lifecycle::{signals, startup, Shutdown};
use sheet_gateway::normalizer::NormalizerServer;

#[derive(Parser)]
#[command(name = "sheet-normalizer")]
#[command(about = "Converts spreadsheets into HTML documents with text summaries", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_normalizer_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sheet-normalizer: {}", e);
            std::process::exit(1);
        }
    };

    startup::init_observability(&config.observability);
    tracing::info!(
        bind_address = %config.normalizer.bind_address,
        max_preview_rows = config.normalizer.max_preview_rows,
        max_markdown_rows = config.normalizer.max_markdown_rows,
        header_rows = ?config.normalizer.header_rows,
        "sheet-normalizer v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let server = NormalizerServer::new(&config);
    let listener = startup::bind(&config.normalizer.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());
    server.run(listener, shutdown.wait()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
