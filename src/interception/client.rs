//! Client side of the normalizer.
//!
//! The orchestrator only sees [`DocumentNormalizer`]; the production
//! implementation posts the file to the normalizer service, and tests swap in
//! in-process fakes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::TimeoutConfig;
use crate::multipart::FormFile;
use crate::normalizer::render::SHEET_SEPARATOR;
use crate::normalizer::service::FILE_FIELD;

/// Why a spreadsheet could not be normalized.
#[derive(Debug, Error)]
pub enum NormalizerError {
    #[error("normalizer timed out after {0} seconds")]
    Timeout(u64),

    #[error("normalizer request failed: {0}")]
    Transport(String),

    #[error("normalizer rejected the file ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("normalizer reply is not understood: {0}")]
    InvalidReply(String),

    #[error("normalizer returned no content")]
    EmptyContent,
}

impl NormalizerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, NormalizerError::Timeout(_))
    }
}

/// Converts one spreadsheet file into HTML markup.
#[async_trait]
pub trait DocumentNormalizer: Send + Sync {
    async fn normalize(&self, file: &FormFile) -> Result<String, NormalizerError>;
}

/// Successful reply of the normalizer service.
///
/// Either a ready combined document, or per-sheet fragments that the gateway
/// joins itself. A sheet value may be a string or a list whose first element
/// is the fragment.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NormalizerReply {
    Combined { combined: String },
    PerSheet { sheets: Map<String, Value> },
}

impl NormalizerReply {
    pub fn into_markup(self) -> String {
        match self {
            NormalizerReply::Combined { combined } => combined,
            NormalizerReply::PerSheet { sheets } => sheets
                .into_iter()
                .filter_map(|(_, value)| match value {
                    Value::String(fragment) => Some(fragment),
                    Value::Array(items) => match items.into_iter().next() {
                        Some(Value::String(fragment)) => Some(fragment),
                        _ => None,
                    },
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(SHEET_SEPARATOR),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: String,
}

/// MIME type sent to the normalizer for a spreadsheet extension.
pub fn spreadsheet_mime(extension: Option<&str>) -> &'static str {
    match extension {
        Some("xls") => "application/vnd.ms-excel",
        _ => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    }
}

/// Normalizer reached over HTTP at `<base>/process`.
pub struct RemoteNormalizer {
    client: reqwest::Client,
    endpoint: String,
    timeout_secs: u64,
}

impl RemoteNormalizer {
    pub fn new(base_url: &str, timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        // Proxies from the environment would reroute this internal hop.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.normalizer_secs))
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/process", base_url.trim_end_matches('/')),
            timeout_secs: timeouts.normalizer_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, err: reqwest::Error) -> NormalizerError {
        if err.is_timeout() {
            NormalizerError::Timeout(self.timeout_secs)
        } else {
            NormalizerError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl DocumentNormalizer for RemoteNormalizer {
    async fn normalize(&self, file: &FormFile) -> Result<String, NormalizerError> {
        let extension = file.extension();
        let part = Part::stream_with_length(reqwest::Body::from(file.data.clone()), file.data.len() as u64)
            .file_name(file.display_name().into_owned())
            .mime_str(spreadsheet_mime(extension.as_deref()))
            .map_err(|e| NormalizerError::Transport(e.to_string()))?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorReply>(&body)
                .map(|reply| reply.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body[..body.len().min(512)]).into_owned());
            return Err(NormalizerError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let reply: NormalizerReply =
            serde_json::from_slice(&body).map_err(|e| NormalizerError::InvalidReply(e.to_string()))?;
        let markup = reply.into_markup();
        if markup.trim().is_empty() {
            return Err(NormalizerError::EmptyContent);
        }
        Ok(markup)
    }
}
