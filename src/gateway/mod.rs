//! Core gateway decision procedure: route matching, rate limiting, and
//! upstream forwarding.

pub mod forward;
pub mod limiter;
pub mod table;

pub use forward::Forwarder;
pub use limiter::{Decision, RateLimiter};
pub use table::{Route, RouteTable};
