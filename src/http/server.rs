//! Gateway HTTP server.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (request id, tracing, timeout)
//! - Classify each request and dispatch it to the orchestrator (uploads),
//!   the normalizer host (downloads) or the backend (everything else)
//! - Record per-request metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use url::Url;

use crate::config::GatewayConfig;
use crate::http::proxy::PassthroughProxy;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::json_error;
use crate::interception::{BackendClient, DocumentNormalizer, Orchestrator, RemoteNormalizer};
use crate::multipart::DecodeLimits;
use crate::observability::metrics;
use crate::routing::{Classifier, RouteDecision};

/// Errors building the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("backend URL is not configured")]
    MissingBackend,

    #[error("invalid upstream URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

fn parse_url(raw: &str) -> Result<Url, ServerError> {
    Url::parse(raw).map_err(|source| ServerError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<Classifier>,
    pub orchestrator: Arc<Orchestrator>,
    pub proxy: PassthroughProxy,
    pub backend_url: Arc<Url>,
    pub normalizer_url: Option<Arc<Url>>,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Create the server, reaching the normalizer over HTTP when configured.
    pub fn new(config: &GatewayConfig) -> Result<Self, ServerError> {
        let normalizer: Option<Arc<dyn DocumentNormalizer>> = match config.upstream.normalizer_url.as_deref() {
            Some(url) => Some(Arc::new(RemoteNormalizer::new(url, &config.timeouts)?)),
            None => None,
        };
        Self::with_normalizer(config, normalizer)
    }

    /// Create the server with a caller-supplied normalizer.
    pub fn with_normalizer(
        config: &GatewayConfig,
        normalizer: Option<Arc<dyn DocumentNormalizer>>,
    ) -> Result<Self, ServerError> {
        let backend_raw = config
            .upstream
            .backend_url
            .as_deref()
            .ok_or(ServerError::MissingBackend)?;
        let backend_url = parse_url(backend_raw)?;
        let normalizer_url = config
            .upstream
            .normalizer_url
            .as_deref()
            .map(parse_url)
            .transpose()?;

        if normalizer.is_none() {
            tracing::warn!("No normalizer configured; spreadsheets will be forwarded unchanged");
        }

        let backend = BackendClient::new(backend_raw, &config.timeouts)?;
        let orchestrator = Orchestrator::new(normalizer, backend, DecodeLimits::from(&config.limits));

        let state = AppState {
            classifier: Arc::new(Classifier::from_config(&config.routes)),
            orchestrator: Arc::new(orchestrator),
            proxy: PassthroughProxy::new(&config.timeouts),
            backend_url: Arc::new(backend_url),
            normalizer_url: normalizer_url.map(Arc::new),
        };

        Ok(Self {
            router: Self::build_router(config, state),
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
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

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Gateway server stopped");
        Ok(())
    }
}

/// Classify, then intercept or forward.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let request_id = request.request_id();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let decision = state.classifier.classify(&method, &path, content_type);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        decision = decision.as_str(),
        "Classified request"
    );

    let response = match decision {
        RouteDecision::Intercept => state.orchestrator.handle(request).await,
        RouteDecision::Download => match &state.normalizer_url {
            Some(url) => state.proxy.forward(url, request).await,
            None => json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "normalizer_unavailable",
                "no normalizer is configured",
            ),
        },
        RouteDecision::Passthrough => state.proxy.forward(&state.backend_url, request).await,
    };

    let status = response.status().as_u16();
    metrics::record_request(decision.as_str(), status, started);
    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        decision = decision.as_str(),
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request completed"
    );
    response
}
