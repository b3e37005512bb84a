//! Unified error types for the gateway request pipeline.
//!
//! Every variant maps to exactly one terminal HTTP response with a fixed,
//! minimal JSON body. Internal detail never reaches the caller; it goes to
//! tracing and, for 5xx terminals, the append-only error log.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Unified error type for request handling.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No credential was presented on a protected route.
    #[error("access denied: no token provided")]
    Unauthenticated,

    /// A credential was presented but failed verification.
    #[error("invalid token: {reason}")]
    InvalidCredential {
        /// Why verification failed (server-side only).
        reason: String,
    },

    /// The client exceeded its request quota for the current window.
    #[error("rate limit exceeded: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the client's window resets.
        retry_after_secs: u64,
    },

    /// No route prefix matches the request path.
    #[error("no route matches {path}")]
    NotFound {
        /// The unmatched request path.
        path: String,
    },

    /// The upstream could not be reached.
    #[error("upstream {upstream} unreachable: {reason}")]
    UpstreamUnreachable {
        /// The matched route prefix.
        upstream: String,
        /// Transport-level failure detail.
        reason: String,
    },

    /// The upstream did not answer within the configured timeout.
    #[error("upstream {upstream} timed out")]
    UpstreamTimeout {
        /// The matched route prefix.
        upstream: String,
    },

    /// Unexpected failure anywhere in the pipeline.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Fixed JSON body sent to clients for error terminals.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Minimal, non-leaking message.
    pub message: &'static str,
}

impl GatewayError {
    /// The HTTP status code for this error terminal.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GatewayError::InvalidCredential { .. } => StatusCode::FORBIDDEN,
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The fixed client-facing message for this error terminal.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::Unauthenticated => "Access Denied: No Token Provided",
            GatewayError::InvalidCredential { .. } => "Invalid Token",
            GatewayError::RateLimited { .. } => "Too many requests, please try again later.",
            GatewayError::NotFound { .. } => "Not Found",
            GatewayError::UpstreamUnreachable { .. } => "Bad Gateway",
            GatewayError::UpstreamTimeout { .. } => "Gateway Timeout",
            GatewayError::Internal(_) => "Internal Server Error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            message: self.public_message(),
        });

        let mut response = (status, body).into_response();

        if let GatewayError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = retry_after_secs.to_string().parse() {
                response.headers_mut().insert("retry-after", value);
            }
        }

        response
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(GatewayError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            GatewayError::InvalidCredential { reason: "expired".into() }.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GatewayError::RateLimited { retry_after_secs: 1 }.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            GatewayError::NotFound { path: "/x".into() }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::UpstreamUnreachable {
                upstream: "/api/tasks".into(),
                reason: "refused".into()
            }
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::UpstreamTimeout { upstream: "/api/tasks".into() }.status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            GatewayError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn public_messages_are_fixed() {
        assert_eq!(
            GatewayError::Unauthenticated.public_message(),
            "Access Denied: No Token Provided"
        );
        assert_eq!(
            GatewayError::InvalidCredential { reason: "bad signature".into() }.public_message(),
            "Invalid Token"
        );
        assert_eq!(
            GatewayError::Internal("secret detail".into()).public_message(),
            "Internal Server Error"
        );
    }

    #[test]
    fn rate_limited_response_carries_retry_after() {
        let response = GatewayError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("retry-after").unwrap(), "42");
    }
}
