//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, validate_normalizer_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment variable {name}: {message}")]
    Env { name: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub const ENV_BACKEND_URL: &str = "GATEWAY_BACKEND_URL";
pub const ENV_NORMALIZER_URL: &str = "GATEWAY_NORMALIZER_URL";
pub const ENV_GATEWAY_PORT: &str = "GATEWAY_PORT";
pub const ENV_NORMALIZER_PORT: &str = "NORMALIZER_PORT";
pub const ENV_LOG_LEVEL: &str = "GATEWAY_LOG_LEVEL";

/// Read a TOML file (when given) and apply environment overrides.
///
/// Does not validate; each binary validates the settings it needs.
pub fn load_unvalidated(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

/// Load and validate the gateway configuration.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let config = load_unvalidated(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate the normalizer service configuration.
pub fn load_normalizer_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let config = load_unvalidated(path)?;
    validate_normalizer_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables on top of file settings.
///
/// Empty values are ignored so that `GATEWAY_NORMALIZER_URL=` in a compose
/// file keeps the degraded mode instead of producing an invalid URL.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(url) = get(ENV_BACKEND_URL) {
        config.upstream.backend_url = Some(url);
    }
    if let Some(url) = get(ENV_NORMALIZER_URL) {
        config.upstream.normalizer_url = Some(url);
    }
    if let Some(port) = get(ENV_GATEWAY_PORT) {
        config.listener.bind_address = with_port(&config.listener.bind_address, ENV_GATEWAY_PORT, &port)?;
    }
    if let Some(port) = get(ENV_NORMALIZER_PORT) {
        config.normalizer.bind_address =
            with_port(&config.normalizer.bind_address, ENV_NORMALIZER_PORT, &port)?;
    }
    if let Some(level) = get(ENV_LOG_LEVEL) {
        config.observability.log_level = level;
    }

    Ok(())
}

fn with_port(bind_address: &str, name: &'static str, port: &str) -> Result<String, ConfigError> {
    let port: u16 = port.parse().map_err(|_| ConfigError::Env {
        name,
        message: format!("'{}' is not a port number", port),
    })?;
    let host = bind_address
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or("0.0.0.0");
    Ok(format!("{}:{}", host, port))
}
