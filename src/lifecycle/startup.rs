//! Startup helpers shared by the binaries.
//!
//! Order: load and validate configuration, initialise logging and metrics,
//! then bind the listener last so traffic only arrives once the server is
//! ready. Any error here is fatal.

use tokio::net::TcpListener;

use crate::config::ObservabilityConfig;
use crate::observability::{logging, metrics};

/// Initialise logging, and the metrics exporter when enabled.
pub fn init_observability(config: &ObservabilityConfig) {
    logging::init_logging(&config.log_level);

    if config.metrics_enabled {
        match config.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }
}

/// Bind a TCP listener and log where it is.
pub async fn bind(address: &str) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok(listener)
}
