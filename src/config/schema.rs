//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway
//! and the normalizer service. All types derive Serde traits for
//! deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway and the normalizer service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend and normalizer locations.
    pub upstream: UpstreamConfig,

    /// Paths that the classifier treats specially.
    pub routes: RoutesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Upload size limits.
    pub limits: LimitsConfig,

    /// Normalizer service and algorithm settings.
    pub normalizer: NormalizerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
        }
    }
}

/// Upstream services the gateway talks to.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the document-management backend. Required.
    pub backend_url: Option<String>,

    /// Base URL of the normalizer service. When absent, spreadsheets are
    /// forwarded unmodified.
    pub normalizer_url: Option<String>,
}

/// Route configuration for the request classifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Upload endpoints. `{name}` segments match any single path segment.
    pub upload_paths: Vec<String>,

    /// Path routed straight to the normalizer host.
    pub download_path: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            upload_paths: vec![
                "/v1/document/upload".to_string(),
                "/api/v1/datasets/{dataset_id}/documents".to_string(),
            ],
            download_path: "/normalizer/download".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Deadline for one normalizer call in seconds.
    pub normalizer_secs: u64,

    /// Deadline for one intercepted backend call in seconds.
    pub backend_secs: u64,

    /// Overall request deadline enforced by the server layer in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            normalizer_secs: 600,
            backend_secs: 600,
            request_secs: 1800,
        }
    }
}

/// Upload size limits applied while decoding multipart bodies.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum size of a whole intercepted body in bytes.
    pub max_body_bytes: u64,

    /// Maximum size of a single part in bytes.
    pub max_file_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 512 * 1024 * 1024,
            max_file_bytes: 256 * 1024 * 1024,
        }
    }
}

/// Normalizer service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Bind address of the normalizer service.
    pub bind_address: String,

    /// Rows rendered into the hidden Markdown layer per sheet.
    pub max_markdown_rows: usize,

    /// Rows rendered into the visible HTML table per sheet.
    pub max_preview_rows: usize,

    /// Rows described line by line in the sheet summary.
    pub summary_rows: usize,

    /// Fixed header height; detected from the sheet when unset.
    pub header_rows: Option<usize>,

    /// Upper bound for a detected header height.
    pub max_header_rows: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5001".to_string(),
            max_markdown_rows: 1000,
            max_preview_rows: 3000,
            summary_rows: 50,
            header_rows: None,
            max_header_rows: 4,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
