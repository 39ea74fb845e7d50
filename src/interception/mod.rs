//! Upload interception subsystem.
//!
//! # Data Flow
//! ```text
//! upload request (classified Intercept)
//!     → orchestrator.rs (decode, partition, convert, re-encode)
//!         → client.rs  (DocumentNormalizer: one spreadsheet → HTML)
//!         → backend.rs (rebuilt multipart → backend)
//!     → relayed backend response, or error.rs JSON failure
//! ```

pub mod backend;
pub mod client;
pub mod error;
pub mod orchestrator;

pub use backend::BackendClient;
pub use client::{DocumentNormalizer, NormalizerError, NormalizerReply, RemoteNormalizer};
pub use error::InterceptError;
pub use orchestrator::{Orchestrator, Stage, MARKUP_CONTENT_TYPE, MARKUP_EXTENSION};
