//! Spreadsheet-normalizing upload gateway library

pub mod config;
pub mod http;
pub mod interception;
pub mod lifecycle;
pub mod multipart;
pub mod normalizer;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use normalizer::NormalizerServer;
