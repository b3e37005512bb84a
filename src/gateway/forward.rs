//! Reverse proxy forwarding to upstream services.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, Response};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::GatewayError;

use super::table::Route;

/// Headers that are connection-scoped and must not be forwarded either way.
const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Forwards requests to upstream services, streaming both directions.
#[derive(Debug, Clone)]
pub struct Forwarder {
    http: reqwest::Client,
}

impl Forwarder {
    /// Create a forwarder with the configured upstream timeouts.
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.upstream_timeout_ms))
            .connect_timeout(std::time::Duration::from_millis(
                config.upstream_connect_timeout_ms,
            ))
            .tcp_nodelay(true)
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    /// Forward a request to the route's upstream and stream the response
    /// back byte-for-byte.
    ///
    /// The destination is `<upstream base><original path and query>`. Host
    /// and hop-by-hop headers are rewritten; everything else, including the
    /// body, passes through untouched. Dropping the returned future (client
    /// disconnect) cancels the in-flight upstream call.
    pub async fn forward(
        &self,
        route: &Route,
        request: Request,
    ) -> Result<Response<Body>, GatewayError> {
        let path_and_query = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());

        let target = format!(
            "{}{}",
            route.upstream.as_str().trim_end_matches('/'),
            path_and_query
        );

        debug!(target = %target, route = route.prefix, "forwarding request");

        let (parts, body) = request.into_parts();

        let mut headers = parts.headers;
        strip_connection_headers(&mut headers);
        headers.remove(header::HOST);
        // The outbound body is streamed, so any inbound length is moot.
        headers.remove(header::CONTENT_LENGTH);

        let upstream_response = self
            .http
            .request(parts.method, &target)
            .headers(headers)
            .body(reqwest::Body::wrap_stream(body.into_data_stream()))
            .send()
            .await
            .map_err(|e| {
                warn!(route = route.prefix, error = %e, "upstream request failed");
                if e.is_timeout() {
                    GatewayError::UpstreamTimeout {
                        upstream: route.prefix.to_string(),
                    }
                } else {
                    GatewayError::UpstreamUnreachable {
                        upstream: route.prefix.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = upstream_response.status();
        let mut response_headers = upstream_response.headers().clone();
        strip_connection_headers(&mut response_headers);

        let mut builder = Response::builder().status(status);
        if let Some(headers) = builder.headers_mut() {
            *headers = response_headers;
        }

        builder
            .body(Body::from_stream(upstream_response.bytes_stream()))
            .map_err(|e| GatewayError::Internal(format!("failed to build response: {}", e)))
    }
}

fn strip_connection_headers(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}
