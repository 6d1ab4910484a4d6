// HTTP routes configuration

use super::handlers::{generate_handler, health_handler};
use super::middleware::request_id_layers;
use crate::config::ServerConfig;
use crate::proxy::ProxyService;
use axum::{
    routing::{any, get},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Path the generation proxy is mounted at.
pub const GENERATE_PATH: &str = "/api/generate";

#[derive(Clone)]
pub struct AppState {
    pub proxy: ProxyService,
}

pub fn create_router(config: &ServerConfig, proxy: ProxyService) -> Router {
    let state = AppState { proxy };

    let (set_request_id, propagate_request_id) = request_id_layers();

    let app = Router::new()
        .route("/health", get(health_handler))
        .route(GENERATE_PATH, any(generate_handler))
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    if config.enable_compression {
        app.layer(CompressionLayer::new())
    } else {
        app
    }
}
