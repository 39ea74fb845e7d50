//! Interception failures and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::interception::client::NormalizerError;
use crate::multipart::CodecError;

/// Why an intercepted upload could not be forwarded.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// Not a decodable multipart body.
    #[error("{0}")]
    MalformedUpload(String),

    #[error("upload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    /// The client stream failed before the body was complete.
    #[error("upload aborted: {0}")]
    Aborted(String),

    #[error("failed to normalize '{filename}': {source}")]
    Normalization {
        filename: String,
        #[source]
        source: NormalizerError,
    },

    #[error("backend timed out after {0} seconds")]
    ForwardTimeout(u64),

    #[error("backend request failed: {0}")]
    Forward(String),
}

impl InterceptError {
    pub fn status(&self) -> StatusCode {
        match self {
            InterceptError::MalformedUpload(_) | InterceptError::Aborted(_) => StatusCode::BAD_REQUEST,
            InterceptError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            InterceptError::Normalization { source, .. } if source.is_timeout() => {
                StatusCode::GATEWAY_TIMEOUT
            }
            InterceptError::Normalization { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            InterceptError::ForwardTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            InterceptError::Forward(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            InterceptError::MalformedUpload(_) => "malformed_upload",
            InterceptError::PayloadTooLarge { .. } => "payload_too_large",
            InterceptError::Aborted(_) => "upload_aborted",
            InterceptError::Normalization { source, .. } if source.is_timeout() => {
                "normalization_timeout"
            }
            InterceptError::Normalization { .. } => "normalization_failed",
            InterceptError::ForwardTimeout(_) => "backend_timeout",
            InterceptError::Forward(_) => "forward_failed",
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            InterceptError::Normalization { filename, .. } => Some(filename),
            _ => None,
        }
    }
}

impl From<CodecError> for InterceptError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Malformed(message) => InterceptError::MalformedUpload(message),
            CodecError::TooLarge { limit } => InterceptError::PayloadTooLarge { limit },
            CodecError::Aborted(message) => InterceptError::Aborted(message),
        }
    }
}

impl IntoResponse for InterceptError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        if let Some(filename) = self.filename() {
            body["filename"] = json!(filename);
        }
        (self.status(), Json(body)).into_response()
    }
}
