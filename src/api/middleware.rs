//! Cross-cutting middleware: rate limiting and request observation.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::error::GatewayError;
use crate::gateway::Decision;
use crate::metrics;

use super::handlers::{AppState, ErrorDetail, MatchedRoute, ROUTE_LABEL_UNMATCHED};

/// Paths that must answer regardless of rate-limit state.
const LIMIT_EXEMPT_PATHS: [&str; 2] = ["/health", "/metrics"];

/// Reject clients over their window ceiling before any routing happens.
pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if LIMIT_EXEMPT_PATHS.contains(&path.as_str()) {
        return next.run(request).await;
    }

    let client = client_identifier(&request);
    match state.limiter.check(&client) {
        Decision::Allowed => next.run(request).await,
        Decision::Limited { retry_after_secs } => {
            warn!(client = %client, path = %path, "rate limit exceeded");
            // Rejected before routing, so resolve the label here.
            let label = state
                .routes
                .match_path(&path)
                .map(|route| route.prefix.to_string())
                .unwrap_or_else(|| ROUTE_LABEL_UNMATCHED.to_string());
            let mut response = GatewayError::RateLimited { retry_after_secs }.into_response();
            response.extensions_mut().insert(MatchedRoute(label));
            response
        }
    }
}

/// Observe every terminal response: one metrics increment per request,
/// plus an error-log append for 5xx terminals.
///
/// Sits outside the rate limiter and the panic catcher so rejected and
/// panicked requests are counted too.
pub async fn observe(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    // Terminals without a label are the fixed local endpoints; their
    // paths are a closed set, so the literal path stays bounded.
    let route = response
        .extensions()
        .get::<MatchedRoute>()
        .map(|m| m.0.clone())
        .unwrap_or_else(|| path.clone());

    metrics::record_request(&method, &route, status);

    if status >= 500 {
        let detail = response
            .extensions()
            .get::<ErrorDetail>()
            .map(|d| d.0.clone())
            .unwrap_or_else(|| format!("HTTP {} on {} {}", status, method, path));
        state.error_log.append(&detail).await;
    }

    response
}

/// Best available client identifier: peer address, else the first
/// `X-Forwarded-For` entry, else a sentinel so unidentifiable traffic
/// still shares one bounded window.
fn client_identifier(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    fn request_with_headers(headers: &[(&str, &str)]) -> Request {
        let mut builder = HttpRequest::builder().uri("/api/tasks/1");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn connect_info_wins_over_forwarded_header() {
        let mut request = request_with_headers(&[("x-forwarded-for", "203.0.113.9")]);
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 55000))));

        assert_eq!(client_identifier(&request), "10.0.0.1");
    }

    #[test]
    fn forwarded_header_is_used_without_connect_info() {
        let request = request_with_headers(&[("x-forwarded-for", "203.0.113.9, 10.0.0.1")]);
        assert_eq!(client_identifier(&request), "203.0.113.9");
    }

    #[test]
    fn unidentifiable_clients_share_a_sentinel() {
        let request = request_with_headers(&[]);
        assert_eq!(client_identifier(&request), "unknown");
    }
}
