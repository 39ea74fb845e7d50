//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → passed by value / Arc into each component constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A missing backend URL is fatal before any traffic is served

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_normalizer_config, ConfigError};
pub use schema::{
    GatewayConfig, LimitsConfig, ListenerConfig, NormalizerConfig, ObservabilityConfig,
    RoutesConfig, TimeoutConfig, UpstreamConfig,
};
