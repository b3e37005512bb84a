//! HTTP surface: router, handlers, and cross-cutting middleware.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
