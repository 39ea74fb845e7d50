//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing, timeout)
//!     → [routing::Classifier decides Intercept / Download / Passthrough]
//!     → interception::Orchestrator        (uploads)
//!     → proxy.rs + websocket.rs            (everything else, streamed)
//!     → response.rs (relay, hop-by-hop stripping via headers.rs)
//!     → Send to client
//! ```

pub mod headers;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use proxy::PassthroughProxy;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{GatewayServer, ServerError};
