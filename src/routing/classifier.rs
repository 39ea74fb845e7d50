//! Request classification.
//!
//! # Responsibilities
//! - Decide, before any body byte is read, what happens to a request
//! - Route the download path to the normalizer host
//! - Select multipart uploads on the configured upload paths
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Download check runs first so it never leaks to the backend
//! - Everything unmatched is passthrough; there is no "not found"

use axum::http::Method;

use crate::config::RoutesConfig;
use crate::routing::matcher::{compile_upload_path, PathMatcher, PathPrefixMatcher};

const MULTIPART_FORM: &str = "multipart/form-data";

/// Outcome of classifying one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Multipart upload to a document endpoint; handled by the orchestrator.
    Intercept,
    /// Download retrieval served by the normalizer host.
    Download,
    /// Everything else; relayed to the backend untouched.
    Passthrough,
}

impl RouteDecision {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::Intercept => "intercept",
            RouteDecision::Download => "download",
            RouteDecision::Passthrough => "passthrough",
        }
    }
}

/// Compiled classifier.
#[derive(Debug)]
pub struct Classifier {
    upload_paths: Vec<Box<dyn PathMatcher>>,
    download_path: PathPrefixMatcher,
}

impl Classifier {
    /// Compile the classifier from route settings.
    pub fn from_config(config: &RoutesConfig) -> Self {
        Self {
            upload_paths: config
                .upload_paths
                .iter()
                .map(|p| compile_upload_path(p))
                .collect(),
            download_path: PathPrefixMatcher::new(config.download_path.clone()),
        }
    }

    /// Classify a request from its method, path and content type.
    pub fn classify(&self, method: &Method, path: &str, content_type: Option<&str>) -> RouteDecision {
        if self.download_path.matches(path) {
            return RouteDecision::Download;
        }

        if method == Method::POST
            && is_multipart_form(content_type)
            && self.upload_paths.iter().any(|m| m.matches(path))
        {
            return RouteDecision::Intercept;
        }

        RouteDecision::Passthrough
    }
}

fn is_multipart_form(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| {
            ct.trim_start()
                .get(..MULTIPART_FORM.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MULTIPART_FORM))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: Option<&str> = Some("multipart/form-data; boundary=xyz");

    fn classifier() -> Classifier {
        Classifier::from_config(&RoutesConfig::default())
    }

    #[test]
    fn test_post_multipart_upload_is_intercepted() {
        let c = classifier();
        assert_eq!(c.classify(&Method::POST, "/v1/document/upload", FORM), RouteDecision::Intercept);
        assert_eq!(
            c.classify(&Method::POST, "/api/v1/datasets/7f3a/documents", FORM),
            RouteDecision::Intercept
        );
        assert_eq!(
            c.classify(&Method::POST, "/v1/document/upload", Some("Multipart/Form-Data; boundary=a")),
            RouteDecision::Intercept
        );
    }

    #[test]
    fn test_other_methods_on_upload_path_pass_through() {
        let c = classifier();
        for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
            assert_eq!(
                c.classify(&method, "/api/v1/datasets/7f3a/documents", FORM),
                RouteDecision::Passthrough
            );
        }
    }

    #[test]
    fn test_non_multipart_post_passes_through() {
        let c = classifier();
        assert_eq!(
            c.classify(&Method::POST, "/v1/document/upload", Some("application/json")),
            RouteDecision::Passthrough
        );
        assert_eq!(c.classify(&Method::POST, "/v1/document/upload", None), RouteDecision::Passthrough);
        assert_eq!(
            c.classify(&Method::POST, "/v1/document/upload", Some("multipart/mixed; boundary=a")),
            RouteDecision::Passthrough
        );
    }

    #[test]
    fn test_other_paths_pass_through() {
        let c = classifier();
        assert_eq!(c.classify(&Method::POST, "/v1/document/list", FORM), RouteDecision::Passthrough);
        assert_eq!(c.classify(&Method::GET, "/", None), RouteDecision::Passthrough);
    }

    #[test]
    fn test_download_path_wins_over_everything() {
        let mut routes = RoutesConfig::default();
        routes.download_path = "/v1/document/upload".to_string();
        let c = Classifier::from_config(&routes);

        assert_eq!(c.classify(&Method::POST, "/v1/document/upload", FORM), RouteDecision::Download);
        assert_eq!(
            classifier().classify(&Method::GET, "/normalizer/download/a.html", None),
            RouteDecision::Download
        );
    }
}
