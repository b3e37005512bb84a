//! HTTP handlers: local endpoints and the proxy dispatch fallback.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::debug;

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::error::GatewayError;
use crate::errorlog::ErrorLog;
use crate::gateway::{Forwarder, RateLimiter, RouteTable};
use crate::metrics;

/// Matched route label, attached to every terminal response so the
/// observation middleware can label its counters.
///
/// Always a registered prefix or a fixed sentinel, never a raw request
/// path, to keep metric cardinality bounded.
#[derive(Debug, Clone)]
pub struct MatchedRoute(pub String);

/// Route label for requests no registered prefix matched.
pub const ROUTE_LABEL_UNMATCHED: &str = "unmatched";

/// Server-side failure detail attached to 5xx responses; only ever
/// written to the error log, never to the client.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

/// Application state shared with handlers.
///
/// The route table and verifier are read-only after startup; the limiter
/// and error log are the only shared mutable pieces.
#[derive(Clone)]
pub struct AppState {
    /// Immutable prefix-to-upstream mapping.
    pub routes: Arc<RouteTable>,
    /// Bearer-token verifier holding the signing secret.
    pub verifier: Arc<TokenVerifier>,
    /// Per-client fixed-window rate limiter.
    pub limiter: Arc<RateLimiter>,
    /// Streaming upstream forwarder.
    pub forwarder: Arc<Forwarder>,
    /// Append-only error log.
    pub error_log: Arc<ErrorLog>,
    /// Handle for rendering the Prometheus exposition.
    pub prometheus: PrometheusHandle,
}

impl AppState {
    /// Build the full application state from configuration.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let routes = RouteTable::from_config(config).map_err(anyhow::Error::msg)?;
        let verifier = TokenVerifier::new(&config.signing_secret());
        let limiter = RateLimiter::new(
            Duration::from_secs(config.rate_limit_window_secs),
            config.rate_limit_max_requests,
        );
        let forwarder = Forwarder::new(config)?;
        let error_log = ErrorLog::open(&config.error_log_path).await?;
        let prometheus = metrics::install_recorder()?;

        Ok(Self {
            routes: Arc::new(routes),
            verifier: Arc::new(verifier),
            limiter: Arc::new(limiter),
            forwarder: Arc::new(forwarder),
            error_log: Arc::new(error_log),
            prometheus,
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "healthy".
    pub status: &'static str,
}

/// Root endpoint response.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    /// Fixed banner message.
    pub message: &'static str,
}

/// Health check handler - always returns 200, independent of auth and
/// rate-limit state.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}

/// Root handler.
pub async fn index() -> impl IntoResponse {
    Json(IndexResponse {
        message: "API Gateway is running",
    })
}

/// Prometheus text exposition handler.
pub async fn metrics_exposition(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.prometheus.render(),
    )
}

/// Fallback handler: the gateway decision procedure.
///
/// Route match, then the authentication gate if the route demands it,
/// then upstream forwarding. Each exit is a terminal response; the
/// observation middleware above counts it exactly once.
pub async fn dispatch(State(state): State<AppState>, mut request: Request) -> Response {
    let path = request.uri().path().to_string();

    let route = match state.routes.match_path(&path) {
        Some(route) => route,
        None => {
            debug!(path = %path, "no route matched");
            return with_route(
                GatewayError::NotFound { path }.into_response(),
                ROUTE_LABEL_UNMATCHED.to_string(),
            );
        }
    };

    if route.requires_auth {
        let auth_header = request.headers().get(header::AUTHORIZATION);
        match state.verifier.verify_header(auth_header) {
            Ok(claims) => {
                // Verified claims travel with the request context.
                request.extensions_mut().insert(claims);
            }
            Err(e) => {
                debug!(route = route.prefix, error = %e, "authentication gate rejected request");
                return with_route(e.into_response(), route.prefix.to_string());
            }
        }
    }

    let prefix = route.prefix.to_string();
    match state.forwarder.forward(route, request).await {
        Ok(response) => with_route(response, prefix),
        Err(e) => {
            let detail = e.to_string();
            let mut response = with_route(e.into_response(), prefix);
            response.extensions_mut().insert(ErrorDetail(detail));
            response
        }
    }
}

fn with_route(mut response: Response, route: String) -> Response {
    response.extensions_mut().insert(MatchedRoute(route));
    response
}
