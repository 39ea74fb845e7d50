//! Interception orchestrator.
//!
//! # Data Flow
//! ```text
//! Received → Classified → Decoded → Partitioned → Normalizing → Reassembling → Forwarded → Responded
//!                                          │
//!                                          └── any failure → Failed (JSON error, backend never called)
//! ```
//!
//! # Design Decisions
//! - Spreadsheets are normalized one after another, never concurrently;
//!   every part keeps its position in the form
//! - The first failed conversion fails the whole upload
//! - Without a configured normalizer, spreadsheets are forwarded unchanged
//!   and a warning is logged per file

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::http::request::RequestIdExt;
use crate::http::response::relay_response;
use crate::interception::backend::BackendClient;
use crate::interception::client::DocumentNormalizer;
use crate::interception::error::InterceptError;
use crate::multipart::{encode, DecodeLimits, FormData, FormFile, MultipartDecoder};
use crate::observability::metrics;

/// Media type of converted files.
pub const MARKUP_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Extension given to converted files.
pub const MARKUP_EXTENSION: &str = "html";

/// Extensions that trigger conversion.
pub const SPREADSHEET_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

/// Progress of one intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Classified,
    Decoded,
    Partitioned,
    Normalizing,
    Reassembling,
    Forwarded,
    Responded,
    Failed,
}

struct StageLog {
    request_id: String,
    current: Stage,
}

impl StageLog {
    fn new(request_id: String) -> Self {
        tracing::debug!(request_id = %request_id, stage = ?Stage::Received, "Interception stage");
        Self {
            request_id,
            current: Stage::Received,
        }
    }

    fn advance(&mut self, stage: Stage) {
        tracing::debug!(
            request_id = %self.request_id,
            from = ?self.current,
            stage = ?stage,
            "Interception stage"
        );
        self.current = stage;
    }
}

/// Whether a file is converted, judged by its decoded extension.
pub fn is_spreadsheet(file: &FormFile) -> bool {
    file.extension()
        .map(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Transmitted filename with its extension replaced by the markup one.
///
/// Works on the name as transmitted, so percent-encoded stems stay encoded
/// exactly once.
pub fn markup_filename(file: &FormFile) -> String {
    format!("{}.{}", file.stem(), MARKUP_EXTENSION)
}

/// Replace a spreadsheet part's payload with its converted markup.
pub fn apply_markup(file: &mut FormFile, markup: String) {
    file.filename = markup_filename(file);
    file.content_type = MARKUP_CONTENT_TYPE.to_string();
    file.data = Bytes::from(markup);
}

/// Runs the intercept pipeline for upload requests.
pub struct Orchestrator {
    normalizer: Option<Arc<dyn DocumentNormalizer>>,
    backend: BackendClient,
    limits: DecodeLimits,
}

impl Orchestrator {
    pub fn new(
        normalizer: Option<Arc<dyn DocumentNormalizer>>,
        backend: BackendClient,
        limits: DecodeLimits,
    ) -> Self {
        Self {
            normalizer,
            backend,
            limits,
        }
    }

    /// Handle one upload. Failures become JSON error responses.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let mut log = StageLog::new(request.request_id());
        log.advance(Stage::Classified);

        match self.process(request, &mut log).await {
            Ok(response) => {
                log.advance(Stage::Responded);
                response
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %log.request_id,
                    stage = ?log.current,
                    error = %e,
                    status = e.status().as_u16(),
                    "Interception failed"
                );
                log.advance(Stage::Failed);
                e.into_response()
            }
        }
    }

    async fn process(&self, request: Request<Body>, log: &mut StageLog) -> Result<Response, InterceptError> {
        let (parts, body) = request.into_parts();
        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| InterceptError::MalformedUpload("missing multipart content type".to_string()))?;

        let decoder = MultipartDecoder::from_content_type(body.into_data_stream(), content_type, self.limits)?;
        let mut form = decoder.collect().await?;
        log.advance(Stage::Decoded);

        let spreadsheets = form.files().filter(|f| is_spreadsheet(f)).count();
        tracing::info!(
            request_id = %log.request_id,
            parts = form.len(),
            spreadsheets,
            "Upload decoded"
        );
        log.advance(Stage::Partitioned);

        if spreadsheets > 0 {
            log.advance(Stage::Normalizing);
            self.normalize_files(&mut form, &log.request_id).await?;
        }

        log.advance(Stage::Reassembling);
        let encoded = encode(&form);
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let upstream = self
            .backend
            .submit(parts.method, path_and_query, &parts.headers, encoded)
            .await?;
        log.advance(Stage::Forwarded);

        tracing::info!(
            request_id = %log.request_id,
            status = upstream.status().as_u16(),
            "Backend responded"
        );
        Ok(relay_response(upstream))
    }

    async fn normalize_files(&self, form: &mut FormData, request_id: &str) -> Result<(), InterceptError> {
        let Some(normalizer) = &self.normalizer else {
            for file in form.files().filter(|f| is_spreadsheet(f)) {
                tracing::warn!(
                    request_id = %request_id,
                    filename = %file.display_name(),
                    "No normalizer configured, forwarding spreadsheet unchanged"
                );
            }
            return Ok(());
        };

        for file in form.files_mut().filter(|f| is_spreadsheet(f)) {
            let started = Instant::now();
            let filename = file.display_name().into_owned();
            tracing::info!(
                request_id = %request_id,
                filename = %filename,
                bytes = file.data.len(),
                "Normalizing spreadsheet"
            );

            let markup = match normalizer.normalize(file).await {
                Ok(markup) => markup,
                Err(source) => {
                    metrics::record_normalization(if source.is_timeout() { "timeout" } else { "failed" }, started);
                    return Err(InterceptError::Normalization { filename, source });
                }
            };
            metrics::record_normalization("ok", started);

            tracing::info!(
                request_id = %request_id,
                filename = %filename,
                markup_bytes = markup.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Spreadsheet normalized"
            );
            apply_markup(file, markup);
        }
        Ok(())
    }
}
