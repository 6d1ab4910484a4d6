//! Axum-based HTTP server for the generation proxy.
//!
//! # Components
//!
//! - `handlers`: `/api/generate` and `/health`.
//! - `middleware`: request ID tracking.
//! - `routes`: router configuration tying handlers and layers together.

mod handlers;
mod middleware;
mod routes;

pub use handlers::{HealthResponse, HealthStatus};
pub use routes::{create_router, AppState, GENERATE_PATH};
