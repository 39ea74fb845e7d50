//! Response construction and relay.
//!
//! Backend responses are streamed to the client without buffering, minus
//! hop-by-hop headers. Gateway-generated errors are small JSON bodies.

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::http::headers::strip_hop_by_hop;

/// JSON error body: `{"error": kind, "message": message}`.
pub fn json_error(status: StatusCode, kind: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": kind,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Turn a backend reply into the client response, streaming the body.
pub fn relay_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers, false);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
