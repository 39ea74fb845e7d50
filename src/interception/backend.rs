//! Submission of rebuilt uploads to the backend.

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue, Method};

use crate::config::TimeoutConfig;
use crate::http::headers::forwardable_headers;
use crate::interception::error::InterceptError;
use crate::multipart::EncodedForm;

/// HTTP client bound to the backend base URL.
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl BackendClient {
    pub fn new(base_url: &str, timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.backend_secs))
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: timeouts.backend_secs,
        })
    }

    /// Absolute backend URL for the original path and query.
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Send the rebuilt body with the original method, path and headers.
    ///
    /// Any backend status, including errors, is a successful submission;
    /// only transport failures are errors.
    pub async fn submit(
        &self,
        method: Method,
        path_and_query: &str,
        original_headers: &HeaderMap,
        form: EncodedForm,
    ) -> Result<reqwest::Response, InterceptError> {
        let mut headers = forwardable_headers(original_headers);
        let content_type = HeaderValue::from_str(&form.content_type())
            .map_err(|e| InterceptError::Forward(e.to_string()))?;
        headers.insert(header::CONTENT_TYPE, content_type);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(form.content_length()));

        self.client
            .request(method, self.url_for(path_and_query))
            .headers(headers)
            .body(form.into_body())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InterceptError::ForwardTimeout(self.timeout_secs)
                } else {
                    InterceptError::Forward(e.to_string())
                }
            })
    }
}
