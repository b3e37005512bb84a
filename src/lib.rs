//! Minimal HTTP API gateway.
//!
//! A single process that terminates client HTTP requests, optionally
//! validates a bearer token, forwards the request to one of several
//! backend services by longest path prefix, rate-limits clients, and
//! records request metrics.
//!
//! # Request pipeline
//!
//! ```text
//! Received -> RateLimitCheck -> RouteMatch -> AuthGate (if required) -> Forward
//!                 |429             |404            |401 / 403              |502 / 504
//! ```
//!
//! Every terminal response is counted exactly once; 5xx terminals also
//! append one line to the error log.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Error taxonomy and HTTP mapping
//! - [`gateway`]: Route table, rate limiter, and upstream forwarder
//! - [`auth`]: Bearer-token verification
//! - [`api`]: Router, handlers, and middleware
//! - [`metrics`]: Prometheus counters and recorder
//! - [`errorlog`]: Append-only error log
//! - [`utils`]: Utility functions

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod errorlog;
pub mod gateway;
pub mod metrics;
pub mod utils;

pub use config::Config;
pub use error::{GatewayError, Result};
