//! Multipart codec subsystem.
//!
//! # Data Flow
//! ```text
//! request body stream
//!     → decode.rs (pull parts one at a time, enforce size limits)
//!     → FormData (ordered fields and files, owned buffers)
//!     → [orchestrator rewrites spreadsheet files]
//!     → encode.rs (fresh boundary, exact length)
//!     → backend request body
//! ```
//!
//! # Design Decisions
//! - Wire order of parts is preserved end to end
//! - Filenames are kept exactly as transmitted; decoding happens only for display
//! - Any decode error drops every buffered part; nothing is forwarded

pub mod decode;
pub mod encode;
pub mod form;

use thiserror::Error;

pub use decode::{decode_bytes, parse_boundary, DecodeLimits, MultipartDecoder};
pub use encode::{encode, EncodedForm};
pub use form::{FormData, FormField, FormFile, FormPart};

/// Errors produced while decoding a multipart body.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The body is not a well-formed multipart stream.
    #[error("malformed multipart body: {0}")]
    Malformed(String),

    /// The body or one of its parts exceeds the configured limit.
    #[error("upload exceeds the limit of {limit} bytes")]
    TooLarge { limit: u64 },

    /// Reading the underlying body failed, usually a client disconnect.
    #[error("upload stream aborted: {0}")]
    Aborted(String),
}

impl From<multer::Error> for CodecError {
    fn from(err: multer::Error) -> Self {
        match err {
            multer::Error::StreamSizeExceeded { limit } => CodecError::TooLarge { limit },
            multer::Error::FieldSizeExceeded { limit, .. } => CodecError::TooLarge { limit },
            multer::Error::StreamReadFailed(e) => CodecError::Aborted(e.to_string()),
            other => CodecError::Malformed(other.to_string()),
        }
    }
}
