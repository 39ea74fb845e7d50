//! Transparent forwarding for everything the gateway does not intercept.
//!
//! # Design Decisions
//! - Bodies stream in both directions; nothing is buffered or re-encoded
//! - Only hop-by-hop headers are touched; `Host` is rewritten by the client
//!   for the target
//! - A failed connection is a 502, never a retry

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, uri::PathAndQuery, Request, StatusCode, Uri},
    response::Response,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::config::TimeoutConfig;
use crate::http::headers::strip_hop_by_hop;
use crate::http::request::RequestIdExt;
use crate::http::response::json_error;
use crate::http::websocket::{is_upgrade_request, spawn_tunnel};

/// Build the upstream URI: target scheme and authority, target base path
/// followed by the original path and query.
pub fn upstream_uri(target: &Url, original: Option<&PathAndQuery>) -> Result<Uri, axum::http::Error> {
    let host = target.host_str().unwrap_or_default();
    let authority = match target.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    let base_path = target.path().trim_end_matches('/');
    let path_and_query = original.map(PathAndQuery::as_str).unwrap_or("/");

    let uri = Uri::builder()
        .scheme(target.scheme())
        .authority(authority)
        .path_and_query(format!("{}{}", base_path, path_and_query))
        .build()?;
    Ok(uri)
}

/// Streaming reverse proxy client.
#[derive(Clone)]
pub struct PassthroughProxy {
    client: Client<HttpConnector, Body>,
}

impl PassthroughProxy {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }

    /// Forward `request` to `target` and stream the reply back.
    pub async fn forward(&self, target: &Url, mut request: Request<Body>) -> Response {
        let request_id = request.request_id();
        let upgrade = is_upgrade_request(request.headers());
        let client_upgrade = upgrade.then(|| hyper::upgrade::on(&mut request));

        let (mut parts, body) = request.into_parts();
        parts.uri = match upstream_uri(target, parts.uri.path_and_query()) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Invalid upstream URI");
                return json_error(StatusCode::BAD_GATEWAY, "forward_failed", e.to_string());
            }
        };
        strip_hop_by_hop(&mut parts.headers, upgrade);
        parts.headers.remove(header::HOST);

        tracing::debug!(
            request_id = %request_id,
            method = %parts.method,
            uri = %parts.uri,
            upgrade,
            "Forwarding request"
        );

        let mut response = match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Upstream error");
                return json_error(StatusCode::BAD_GATEWAY, "forward_failed", "upstream request failed");
            }
        };

        if response.status() == StatusCode::SWITCHING_PROTOCOLS {
            if let Some(client_upgrade) = client_upgrade {
                let backend_upgrade = hyper::upgrade::on(&mut response);
                spawn_tunnel(client_upgrade, backend_upgrade, request_id);
            }
            return response.map(Body::new);
        }

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers, false);
        Response::from_parts(parts, Body::new(body))
    }
}
