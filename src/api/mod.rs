//! HTTP interface to the converters

pub mod handlers;
pub mod models;
pub mod routes;

pub use handlers::AppState;
pub use routes::{create_router, create_router_with_cache};
