//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route decision and status
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency by decision
//! - `gateway_normalizations_total` (counter): spreadsheet conversions by outcome
//! - `gateway_normalization_duration_seconds` (histogram): time spent in the normalizer
//! - `normalizer_documents_total` (counter): documents processed by the normalizer service
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished gateway request.
pub fn record_request(decision: &'static str, status: u16, started: Instant) {
    counter!(
        "gateway_requests_total",
        "decision" => decision,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "decision" => decision)
        .record(started.elapsed().as_secs_f64());
}

/// Record one spreadsheet conversion attempted by the gateway.
pub fn record_normalization(outcome: &'static str, started: Instant) {
    counter!("gateway_normalizations_total", "outcome" => outcome).increment(1);
    histogram!("gateway_normalization_duration_seconds", "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

/// Record one document handled by the normalizer service.
pub fn record_document(outcome: &'static str) {
    counter!("normalizer_documents_total", "outcome" => outcome).increment(1);
}
