//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, content-type)
//!     → classifier.rs (decision, before the body is touched)
//!     → matcher.rs (evaluate path conditions)
//!     → Return: Intercept | Download | Passthrough
//!
//! Compilation (at startup):
//!     RoutesConfig
//!     → Compile matchers (exact, template, prefix)
//!     → Freeze as immutable Classifier
//! ```
//!
//! # Design Decisions
//! - Matchers compiled at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always yields the same decision

pub mod classifier;
pub mod matcher;

pub use classifier::{Classifier, RouteDecision};
