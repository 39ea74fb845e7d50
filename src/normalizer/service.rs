//! HTTP front of the normalizer.
//!
//! # Endpoints
//! - `POST /process`: multipart body with one file field named `file`;
//!   replies with the normalized document as JSON
//! - `GET /health`: liveness probe
//!
//! # Design Decisions
//! - The multipart body goes through the same decoder the gateway uses, with
//!   the same size limits
//! - Normalization runs on the blocking pool so large workbooks never stall
//!   the runtime

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::multipart::{CodecError, DecodeLimits, MultipartDecoder};
use crate::normalizer::{normalize, NormalizeOptions, NormalizedDocument};
use crate::observability::metrics;

/// Name reported by the health endpoint.
pub const SERVICE_NAME: &str = "sheet-normalizer";

/// Multipart field that carries the workbook.
pub const FILE_FIELD: &str = "file";

#[derive(Clone)]
struct ServiceState {
    options: Arc<NormalizeOptions>,
    limits: DecodeLimits,
}

/// Reply body of `POST /process`.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub filename: String,
    pub sheet_names: Vec<String>,
    /// Sheet name to its HTML fragment, in workbook order.
    pub sheets: Map<String, Value>,
    pub summary: Option<String>,
    pub combined: String,
}

impl From<NormalizedDocument> for ProcessResponse {
    fn from(document: NormalizedDocument) -> Self {
        let sheet_names = document.sheets.iter().map(|s| s.name.clone()).collect();
        let sheets = document
            .sheets
            .into_iter()
            .map(|s| (s.name, Value::String(s.markup)))
            .collect();
        Self {
            filename: document.filename,
            sheet_names,
            sheets,
            summary: document.summary,
            combined: document.combined,
        }
    }
}

/// HTTP server for the normalizer.
pub struct NormalizerServer {
    router: Router,
}

impl NormalizerServer {
    pub fn new(config: &GatewayConfig) -> Self {
        let state = ServiceState {
            options: Arc::new(NormalizeOptions::from(&config.normalizer)),
            limits: DecodeLimits::from(&config.limits),
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: ServiceState) -> Router {
        Router::new()
            .route("/process", post(process_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(propagate_request_id_layer())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The router, for embedding in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tracing::info!(address = %listener.local_addr()?, "Normalizer service starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Normalizer service stopped");
        Ok(())
    }
}

fn error_reply(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn process_handler(State(state): State<ServiceState>, request: Request<Body>) -> Response {
    let request_id = request.request_id();
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let decoded = match MultipartDecoder::from_content_type(
        request.into_body().into_data_stream(),
        &content_type,
        state.limits,
    ) {
        Ok(decoder) => decoder.collect().await,
        Err(e) => Err(e),
    };
    let form = match decoded {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejected upload");
            metrics::record_document("rejected");
            let status = match e {
                CodecError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            return error_reply(status, e.to_string());
        }
    };

    let Some(file) = form.file(FILE_FIELD) else {
        metrics::record_document("rejected");
        return error_reply(StatusCode::BAD_REQUEST, "No file");
    };
    let filename = file.display_name().into_owned();
    let data = file.data.clone();
    let options = state.options.clone();

    tracing::info!(
        request_id = %request_id,
        filename = %filename,
        bytes = data.len(),
        "Processing workbook"
    );

    let name = filename.clone();
    let result = tokio::task::spawn_blocking(move || normalize(&data, &name, &options)).await;

    match result {
        Ok(Ok(document)) => {
            tracing::info!(
                request_id = %request_id,
                filename = %filename,
                sheets = document.sheets.len(),
                "Workbook normalized"
            );
            metrics::record_document("ok");
            Json(ProcessResponse::from(document)).into_response()
        }
        Ok(Err(e)) => {
            tracing::warn!(request_id = %request_id, filename = %filename, error = %e, "Normalization failed");
            metrics::record_document("failed");
            error_reply(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, filename = %filename, error = %e, "Normalization task panicked");
            metrics::record_document("failed");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "normalization task failed")
        }
    }
}

async fn health_handler() -> Json<Value> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    Json(json!({
        "status": "healthy",
        "timestamp": timestamp,
        "service": SERVICE_NAME,
    }))
}
