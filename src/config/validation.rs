//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require the backend URL, check URLs and bind addresses parse
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check route patterns are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending setting.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration for the gateway binary.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.upstream.backend_url.as_deref() {
        None | Some("") => errors.push(ValidationError::new(
            "upstream.backend_url",
            "backend URL is required",
        )),
        Some(raw) => check_http_url("upstream.backend_url", raw, &mut errors),
    }

    if let Some(raw) = config.upstream.normalizer_url.as_deref() {
        check_http_url("upstream.normalizer_url", raw, &mut errors);
    }

    check_bind_address("listener.bind_address", &config.listener.bind_address, &mut errors);

    if config.routes.upload_paths.is_empty() {
        errors.push(ValidationError::new(
            "routes.upload_paths",
            "at least one upload path is required",
        ));
    }
    for path in &config.routes.upload_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(
                "routes.upload_paths",
                format!("'{}' must start with '/'", path),
            ));
        }
    }
    if !config.routes.download_path.starts_with('/') || config.routes.download_path.len() < 2 {
        errors.push(ValidationError::new(
            "routes.download_path",
            "must be an absolute path other than '/'",
        ));
    }

    let timeouts = [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.normalizer_secs", config.timeouts.normalizer_secs),
        ("timeouts.backend_secs", config.timeouts.backend_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if config.limits.max_file_bytes == 0 {
        errors.push(ValidationError::new("limits.max_file_bytes", "must be greater than zero"));
    }
    if config.limits.max_body_bytes < config.limits.max_file_bytes {
        errors.push(ValidationError::new(
            "limits.max_body_bytes",
            "must be at least limits.max_file_bytes",
        ));
    }

    errors.extend(normalizer_errors(config));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate only the settings the normalizer service binary reads.
pub fn validate_normalizer_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = normalizer_errors(config);
    if config.limits.max_file_bytes == 0 {
        errors.push(ValidationError::new("limits.max_file_bytes", "must be greater than zero"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn normalizer_errors(config: &GatewayConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let normalizer = &config.normalizer;

    check_bind_address("normalizer.bind_address", &normalizer.bind_address, &mut errors);
    if normalizer.max_header_rows == 0 {
        errors.push(ValidationError::new("normalizer.max_header_rows", "must be greater than zero"));
    }
    if normalizer.header_rows == Some(0) {
        errors.push(ValidationError::new("normalizer.header_rows", "must be greater than zero when set"));
    }
    if normalizer.max_preview_rows == 0 || normalizer.max_markdown_rows == 0 {
        errors.push(ValidationError::new(
            "normalizer.max_preview_rows",
            "row limits must be greater than zero",
        ));
    }

    errors
}

fn check_http_url(field: &'static str, raw: &str, errors: &mut Vec<ValidationError>) {
    match url::Url::parse(raw) {
        // Upstreams sit on the internal network; the passthrough client speaks plain HTTP.
        Ok(url) if url.scheme() == "http" => {
            if url.host_str().is_none() {
                errors.push(ValidationError::new(field, format!("'{}' has no host", raw)));
            }
        }
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("'{}' is not a URL: {}", raw, e))),
    }
}

fn check_bind_address(field: &'static str, raw: &str, errors: &mut Vec<ValidationError>) {
    if raw.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("'{}' is not a socket address", raw)));
    }
}
