//! HTTP API
//!
//! REST routes, handlers and extractors.

pub mod extractors;
pub mod handlers;
pub mod routes;

pub use extractors::AuthUser;
pub use routes::create_router;
